//! Test fixtures for common scenarios.

use ledger_tx_core::{
    identifier_from_seed, Asset, Event, Identifier, Keypair, Reference, Result, Transaction,
    Witness, DEFAULT_ID_LENGTH,
};

/// Fixed timestamp used by fixtures so that ids are reproducible.
pub const FIXTURE_TIMESTAMP: i64 = 1_700_000_000_000;

/// A signer with a stable identity, plus helpers that build transactions
/// owned by it.
pub struct TestFixture {
    pub keypair: Keypair,
    pub user_id: Identifier,
    pub id_length: usize,
}

impl TestFixture {
    /// Create a fixture with a random keypair.
    pub fn new() -> Self {
        let keypair = Keypair::generate();
        let user_id = identifier_from_seed(keypair.public_key_bytes(), DEFAULT_ID_LENGTH);
        Self {
            keypair,
            user_id,
            id_length: DEFAULT_ID_LENGTH,
        }
    }

    /// Create a fixture with a deterministic keypair.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let keypair = Keypair::from_seed(&seed);
        let user_id = identifier_from_seed(keypair.public_key_bytes(), DEFAULT_ID_LENGTH);
        Self {
            keypair,
            user_id,
            id_length: DEFAULT_ID_LENGTH,
        }
    }

    /// Same identity, different id length.
    pub fn with_id_length(mut self, id_length: usize) -> Self {
        self.id_length = id_length;
        self.user_id = Identifier::fit(self.user_id.as_bytes(), id_length);
        self
    }

    pub fn user(&self) -> &[u8] {
        self.user_id.as_bytes()
    }

    /// An Asset owned by this fixture with a fixed nonce.
    pub fn make_asset(&self, body: &str) -> Result<Asset> {
        let mut asset = Asset::new(self.id_length);
        asset.set_owner(self.user());
        asset.set_nonce(vec![0x5a; self.id_length]);
        asset.set_body_string(body)?;
        Ok(asset)
    }

    /// An Event in `group` that this fixture must approve to spend.
    pub fn make_event(&self, group: &[u8], body: &str) -> Result<Event> {
        let mut event = Event::new(self.id_length);
        event.attach(group, self.make_asset(body)?);
        event.add_mandatory_approver(self.user());
        Ok(event)
    }

    /// A one-Event transaction with this fixture as the only witness. Not
    /// yet signed.
    pub fn make_transaction(&self, body: &str) -> Result<Transaction> {
        let mut tx = Transaction::new(self.id_length);
        tx.set_timestamp(FIXTURE_TIMESTAMP);
        tx.add_event(self.make_event(b"fixture-group", body)?);
        tx.set_witness(Witness::new(self.id_length))
            .add_witness(self.user())?;
        Ok(tx)
    }

    /// Sign `tx` and place the signature in this fixture's slot.
    pub fn sign(&self, tx: &mut Transaction) -> Result<u16> {
        let signature = tx.sign(&self.keypair)?;
        tx.add_signature(self.user(), signature)
    }

    /// A transaction spending Event `event_index` of `prev`, approved and
    /// signed by this fixture, with a fresh Event handed to `recipient`.
    ///
    /// `prev` must already have an id.
    pub fn make_spend(
        &self,
        prev: &Transaction,
        event_index: usize,
        recipient: &TestFixture,
        body: &str,
    ) -> Result<Transaction> {
        let group = prev.events()[event_index].asset_group_id().clone();

        let mut tx = Transaction::new(self.id_length);
        tx.set_timestamp(FIXTURE_TIMESTAMP + 1);
        let mut event = recipient.make_event(group.as_bytes(), body)?;
        event.add_reference_index(0);
        tx.add_event(event);

        let mut reference = tx.add_reference(Reference::new(self.id_length));
        reference.attach(group.as_bytes(), prev, event_index)?;
        reference.add_approver(self.user())?;

        self.sign(&mut tx)?;
        Ok(tx)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create `count` fixtures with distinct deterministic keys.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[1] = (i >> 8) as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}
