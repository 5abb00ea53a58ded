//! Event: a UTXO-style output. An asset plus the policy naming who may later
//! approve spending it.
//!
//! Wire layout:
//! ```text
//! LP(asset_group_id)
//! u16 n {u16 reference_index}
//! u16 n {LP(mandatory_approver)}
//! u16 option_numerator u16 option_denominator
//! u16 n {LP(option_approver)}
//! u32 asset_len [Asset]
//! ```

use std::fmt;

use crate::asset::Asset;
use crate::error::Result;
use crate::types::Identifier;
use crate::wire::{Reader, Writer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    id_length: usize,
    asset_group_id: Identifier,
    reference_indices: Vec<u16>,
    mandatory_approvers: Vec<Identifier>,
    option_approver_numerator: u16,
    option_approver_denominator: u16,
    option_approvers: Vec<Identifier>,
    asset: Option<Asset>,
}

impl Event {
    pub fn new(id_length: usize) -> Self {
        Self {
            id_length,
            asset_group_id: Identifier::fit(&[], id_length),
            reference_indices: Vec::new(),
            mandatory_approvers: Vec::new(),
            option_approver_numerator: 0,
            option_approver_denominator: 0,
            option_approvers: Vec::new(),
            asset: None,
        }
    }

    /// Set the asset group and the owned asset. The asset takes this event's
    /// id length.
    pub fn attach(&mut self, asset_group_id: &[u8], mut asset: Asset) {
        self.asset_group_id = Identifier::fit(asset_group_id, self.id_length);
        asset.set_id_length(self.id_length);
        self.asset = Some(asset);
    }

    /// Record that this event consumes the transaction's Reference at `index`.
    pub fn add_reference_index(&mut self, index: u16) {
        self.reference_indices.push(index);
    }

    pub fn add_mandatory_approver(&mut self, user_id: &[u8]) {
        self.mandatory_approvers
            .push(Identifier::fit(user_id, self.id_length));
    }

    pub fn add_option_approver(&mut self, user_id: &[u8]) {
        self.option_approvers
            .push(Identifier::fit(user_id, self.id_length));
    }

    /// Advisory k-of-n policy over the option approvers. Not validated here.
    pub fn set_option_threshold(&mut self, numerator: u16, denominator: u16) {
        self.option_approver_numerator = numerator;
        self.option_approver_denominator = denominator;
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    pub fn asset_group_id(&self) -> &Identifier {
        &self.asset_group_id
    }

    pub fn reference_indices(&self) -> &[u16] {
        &self.reference_indices
    }

    pub fn mandatory_approvers(&self) -> &[Identifier] {
        &self.mandatory_approvers
    }

    pub fn option_approvers(&self) -> &[Identifier] {
        &self.option_approvers
    }

    pub fn option_threshold(&self) -> (u16, u16) {
        (
            self.option_approver_numerator,
            self.option_approver_denominator,
        )
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn asset_mut(&mut self) -> Option<&mut Asset> {
        self.asset.as_mut()
    }

    pub(crate) fn set_id_length(&mut self, id_length: usize) {
        if self.id_length == id_length {
            return;
        }
        self.id_length = id_length;
        self.asset_group_id.refit(id_length);
        for id in self
            .mandatory_approvers
            .iter_mut()
            .chain(self.option_approvers.iter_mut())
        {
            id.refit(id_length);
        }
        if let Some(asset) = &mut self.asset {
            asset.set_id_length(id_length);
        }
    }

    pub(crate) fn ensure_asset_id(&mut self) -> Result<()> {
        match &mut self.asset {
            Some(asset) => asset.ensure_id(),
            None => Ok(()),
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.put_length_prefixed(self.asset_group_id.as_bytes())?;

        w.put_count(self.reference_indices.len(), "reference indices")?;
        for &index in &self.reference_indices {
            w.put_u16(index);
        }

        w.put_count(self.mandatory_approvers.len(), "mandatory approvers")?;
        for approver in &self.mandatory_approvers {
            w.put_length_prefixed(approver.as_bytes())?;
        }

        w.put_u16(self.option_approver_numerator);
        w.put_u16(self.option_approver_denominator);

        w.put_count(self.option_approvers.len(), "option approvers")?;
        for approver in &self.option_approvers {
            w.put_length_prefixed(approver.as_bytes())?;
        }

        match &self.asset {
            Some(asset) => w.put_frame_u32(&asset.pack()?)?,
            None => w.put_u32(0),
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(bytes: &[u8], id_length: usize) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let asset_group_id = Identifier::from(r.get_length_prefixed()?);

        let n = r.get_u16()?;
        let reference_indices = (0..n).map(|_| r.get_u16()).collect::<Result<Vec<_>>>()?;

        let n = r.get_u16()?;
        let mandatory_approvers = read_ids(&mut r, n)?;

        let option_approver_numerator = r.get_u16()?;
        let option_approver_denominator = r.get_u16()?;

        let n = r.get_u16()?;
        let option_approvers = read_ids(&mut r, n)?;

        let asset_bytes = r.get_frame_u32()?;
        let asset = if asset_bytes.is_empty() {
            None
        } else {
            Some(Asset::unpack(asset_bytes, id_length)?)
        };
        r.finish("event")?;

        Ok(Self {
            id_length,
            asset_group_id,
            reference_indices,
            mandatory_approvers,
            option_approver_numerator,
            option_approver_denominator,
            option_approvers,
            asset,
        })
    }
}

pub(crate) fn read_ids(r: &mut Reader<'_>, count: u16) -> Result<Vec<Identifier>> {
    (0..count)
        .map(|_| r.get_length_prefixed().map(Identifier::from))
        .collect()
}

fn write_id_list(f: &mut fmt::Formatter<'_>, ids: &[Identifier]) -> fmt::Result {
    if ids.is_empty() {
        return writeln!(f, "    - None");
    }
    for id in ids {
        writeln!(f, "    - {id}")?;
    }
    Ok(())
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  asset_group_id: {}", self.asset_group_id)?;
        if self.reference_indices.is_empty() {
            writeln!(f, "  reference_indices: None")?;
        } else {
            writeln!(f, "  reference_indices: {:?}", self.reference_indices)?;
        }
        writeln!(f, "  mandatory_approvers:")?;
        write_id_list(f, &self.mandatory_approvers)?;
        writeln!(f, "  option_approvers:")?;
        write_id_list(f, &self.option_approvers)?;
        writeln!(
            f,
            "  option_approver_num: {}/{}",
            self.option_approver_numerator, self.option_approver_denominator
        )?;
        match &self.asset {
            Some(asset) => write!(f, "{asset}"),
            None => writeln!(f, "  Asset: None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(id_length: usize) -> Event {
        let mut asset = Asset::new(id_length);
        asset.set_owner(b"owner");
        asset.set_body_string("hello").unwrap();

        let mut event = Event::new(id_length);
        event.attach(b"group", asset);
        event.add_reference_index(0);
        event.add_mandatory_approver(b"alice");
        event.add_option_approver(b"bob");
        event.add_option_approver(b"carol");
        event.set_option_threshold(1, 2);
        event
    }

    #[test]
    fn test_pack_unpack_preserves_fields() {
        let event = sample_event(8);
        let packed = event.pack().unwrap();
        let decoded = Event::unpack(&packed, 8).unwrap();

        assert_eq!(decoded.asset_group_id(), event.asset_group_id());
        assert_eq!(decoded.reference_indices(), &[0]);
        assert_eq!(decoded.mandatory_approvers(), event.mandatory_approvers());
        assert_eq!(decoded.option_approvers().len(), 2);
        assert_eq!(decoded.option_threshold(), (1, 2));
        assert_eq!(decoded.asset().unwrap().body_str(), Some("hello"));
        assert_eq!(decoded.pack().unwrap(), packed);
    }

    #[test]
    fn test_event_without_asset() {
        let bare = Event::new(32);
        let packed = bare.pack().unwrap();
        assert_eq!(&packed[packed.len() - 4..], &[0, 0, 0, 0]);
        assert!(Event::unpack(&packed, 32).unwrap().asset().is_none());
    }

    #[test]
    fn test_approvers_fitted_to_id_length() {
        let event = sample_event(4);
        assert!(event.mandatory_approvers().iter().all(|a| a.len() == 4));
        assert_eq!(event.mandatory_approvers()[0].as_bytes(), b"alic");
    }

    #[test]
    fn test_set_id_length_propagates_to_asset() {
        let mut event = sample_event(32);
        event.set_id_length(8);
        assert_eq!(event.asset_group_id().len(), 8);
        assert_eq!(event.asset().unwrap().id_length(), 8);
        assert_eq!(event.asset().unwrap().user_id().len(), 8);
        assert_eq!(event.asset().unwrap().nonce().len(), 8);
    }

    #[test]
    fn test_truncated_event_rejected() {
        let packed = sample_event(32).pack().unwrap();
        let err = Event::unpack(&packed[..packed.len() - 1], 32).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_display_lists_approvers() {
        let dump = sample_event(4).to_string();
        assert!(dump.contains("mandatory_approvers:"));
        assert!(dump.contains("option_approver_num: 1/2"));
    }
}
