use std::fmt;
use std::sync::Arc;

use super::error::{StorageError, StorageResult};
use super::page_size;
use crate::tuple::{Tuple, TupleDesc};
use crate::tx::TransactionId;

/// Slot identifier within a page
pub type SlotId = usize;

/// Identifies a page within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: u32,
    pub page_no: usize,
}

impl PageId {
    pub fn new(table_id: u32, page_no: usize) -> Self {
        Self { table_id, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_no)
    }
}

/// Physical identity of a tuple: the page it lives on plus its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub pid: PageId,
    pub slot: SlotId,
}

impl RecordId {
    pub fn new(pid: PageId, slot: SlotId) -> Self {
        Self { pid, slot }
    }
}

/// A heap page: a header bitmap tracking slot occupancy followed by a fixed
/// number of fixed-width tuple slots, zero-padded to the page size.
///
/// Bit `i` of the header (LSB-first within each byte) is set iff slot `i`
/// is occupied. Empty slots hold default-valued tuples in memory; their
/// on-disk bytes are ignored on read and zeroed on write.
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: PageId,
    desc: Arc<TupleDesc>,
    header: Vec<u8>,
    tuples: Vec<Tuple>,
    dirtier: Option<TransactionId>,
}

impl HeapPage {
    /// Number of tuple slots a page holds for the given schema.
    ///
    /// Each slot costs one header bit plus the tuple's fixed width.
    pub fn slots_per_page(desc: &TupleDesc) -> usize {
        (page_size() * 8) / (desc.byte_size() * 8 + 1)
    }

    /// Header size in bytes for the given schema.
    pub fn header_size(desc: &TupleDesc) -> usize {
        Self::slots_per_page(desc).div_ceil(8)
    }

    /// A fully zeroed page image, used when appending to a heap file.
    pub fn empty_page_data() -> Vec<u8> {
        vec![0u8; page_size()]
    }

    /// Parse a page from its on-disk image.
    pub fn new(pid: PageId, data: &[u8], desc: Arc<TupleDesc>) -> StorageResult<Self> {
        if data.len() != page_size() {
            return Err(StorageError::InvalidPageData(format!(
                "expected {} bytes, got {}",
                page_size(),
                data.len()
            )));
        }

        let num_slots = Self::slots_per_page(&desc);
        let header_size = Self::header_size(&desc);
        let header = data[..header_size].to_vec();
        let slot_size = desc.byte_size();

        let mut tuples = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            let occupied = (header[slot / 8] >> (slot % 8)) & 1 == 1;
            if occupied {
                let start = header_size + slot * slot_size;
                let mut tuple = Tuple::parse(&data[start..start + slot_size], desc.clone())?;
                tuple.set_record_id(Some(RecordId::new(pid, slot)));
                tuples.push(tuple);
            } else {
                tuples.push(Tuple::new(desc.clone()));
            }
        }

        Ok(Self {
            pid,
            desc,
            header,
            tuples,
            dirtier: None,
        })
    }

    pub fn id(&self) -> PageId {
        self.pid
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn num_slots(&self) -> usize {
        self.tuples.len()
    }

    fn is_slot_used(&self, slot: SlotId) -> bool {
        (self.header[slot / 8] >> (slot % 8)) & 1 == 1
    }

    fn set_slot_used(&mut self, slot: SlotId, used: bool) {
        if used {
            self.header[slot / 8] |= 1 << (slot % 8);
        } else {
            self.header[slot / 8] &= !(1 << (slot % 8));
        }
    }

    /// Count empty slots by scanning the header bitmap.
    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots())
            .filter(|&slot| !self.is_slot_used(slot))
            .count()
    }

    /// Iterate the tuples of occupied slots in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples
            .iter()
            .enumerate()
            .filter(|(slot, _)| self.is_slot_used(*slot))
            .map(|(_, t)| t)
    }

    /// Store `tuple` in the lowest-indexed empty slot and assign its
    /// record id.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> StorageResult<RecordId> {
        if **tuple.desc() != *self.desc {
            return Err(StorageError::SchemaMismatch(format!(
                "tuple schema ({}) does not match page schema ({})",
                tuple.desc(),
                self.desc
            )));
        }
        let slot = (0..self.num_slots())
            .find(|&slot| !self.is_slot_used(slot))
            .ok_or(StorageError::PageFull(self.pid))?;

        let rid = RecordId::new(self.pid, slot);
        tuple.set_record_id(Some(rid));
        self.tuples[slot] = tuple;
        self.set_slot_used(slot, true);
        Ok(rid)
    }

    /// Clear the slot named by the tuple's record id.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> StorageResult<()> {
        let rid = tuple.record_id().ok_or(StorageError::NoRecordId)?;
        if rid.pid != self.pid || rid.slot >= self.num_slots() || !self.is_slot_used(rid.slot)
        {
            return Err(StorageError::TupleNotOnPage(self.pid));
        }
        self.set_slot_used(rid.slot, false);
        self.tuples[rid.slot] = Tuple::new(self.desc.clone());
        Ok(())
    }

    /// Record or clear the transaction that dirtied this page.
    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirtier = if dirty { Some(tid) } else { None };
    }

    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtier.is_some()
    }

    /// Re-encode the page to its on-disk image. Vacated slots are zeroed.
    pub fn page_data(&self) -> Vec<u8> {
        let mut data = vec![0u8; page_size()];
        data[..self.header.len()].copy_from_slice(&self.header);

        let slot_size = self.desc.byte_size();
        for (slot, tuple) in self.tuples.iter().enumerate() {
            if self.is_slot_used(slot) {
                let start = self.header.len() + slot * slot_size;
                data[start..start + slot_size].copy_from_slice(&tuple.serialize());
            }
        }
        data
    }
}
