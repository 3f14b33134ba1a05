use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::descriptor::Descriptor;
use crate::{
    ast::Name,
    error::{IlangError, IlangResult},
};

pub type Slot = u16;

/// Local variable or parameter bound to a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: Name,
    pub desc: Descriptor,
    pub slot: Slot,
    /// Declared length, for fixed size arrays.
    pub array_len: Option<u32>,
}

/// Slot frame of one emitted method.
///
/// Slots are handed out from a monotonic counter and never recycled,
/// even when the declaring block has closed. Declaring a name a second
/// time binds it to a fresh slot.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<Name, Symbol>,
    next_slot: Slot,
    /// Bindings replaced inside each open block, restored when it closes.
    shadowed: Vec<Vec<(Name, Option<Symbol>)>>,
}

impl SymbolTable {
    /// Creates a frame whose first allocation lands on `first_slot`.
    #[inline]
    pub fn starting_at(first_slot: Slot) -> Self {
        Self {
            symbols: BTreeMap::new(),
            next_slot: first_slot,
            shadowed: vec![],
        }
    }

    pub fn declare(&mut self, name: Name, desc: Descriptor, array_len: Option<u32>) -> IlangResult<Slot> {
        let slot = self.next_slot;
        self.next_slot = slot.checked_add(desc.width()).ok_or(IlangError::SlotOverflow)?;
        let previous = self.symbols.insert(
            name.clone(),
            Symbol {
                name: name.clone(),
                desc,
                slot,
                array_len,
            },
        );
        if let Some(block) = self.shadowed.last_mut() {
            block.push((name, previous));
        }
        Ok(slot)
    }

    #[inline]
    pub fn push_scope(&mut self) {
        self.shadowed.push(vec![]);
    }

    /// Closes the innermost block, unbinding its names. Slot numbering
    /// is left untouched.
    pub fn pop_scope(&mut self) {
        let block = self.shadowed.pop().unwrap_or_default();
        for (name, previous) in block.into_iter().rev() {
            match previous {
                Some(symbol) => self.symbols.insert(name, symbol),
                None => self.symbols.remove(&name),
            };
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> IlangResult<&Symbol> {
        self.get(name).ok_or_else(|| IlangError::UnknownVariable(name.into()))
    }

    /// Number of slots the frame needs, including any reserved ones.
    #[inline]
    pub fn slot_count(&self) -> Slot {
        self.next_slot
    }
}

/// Record name to ordered field layout.
#[derive(Debug, Default)]
pub struct RecordTable {
    records: IndexMap<Name, IndexMap<Name, Descriptor>>,
}

impl RecordTable {
    #[inline]
    pub fn insert(&mut self, name: Name, fields: IndexMap<Name, Descriptor>) {
        self.records.insert(name, fields);
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn fields(&self, record: &str) -> IlangResult<&IndexMap<Name, Descriptor>> {
        self.records
            .get(record)
            .ok_or_else(|| IlangError::UnknownRecord(record.into()))
    }

    pub fn field(&self, record: &str, field: &str) -> IlangResult<&Descriptor> {
        self.fields(record)?
            .get(field)
            .ok_or_else(|| IlangError::UnknownField {
                record: record.into(),
                field: field.into(),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wide_values_take_two_slots() {
        let mut table = SymbolTable::starting_at(1);
        let a = table.declare("a".into(), Descriptor::Double, None).unwrap();
        let b = table.declare("b".into(), Descriptor::Int, None).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, a + 2);
        assert_eq!(table.slot_count(), 4);
    }

    #[test]
    fn test_redeclaration_never_reuses_slots() {
        let mut table = SymbolTable::default();
        let first = table.declare("i".into(), Descriptor::Int, None).unwrap();
        let second = table.declare("i".into(), Descriptor::Int, None).unwrap();
        assert_ne!(first, second);
        assert_eq!(table.lookup("i").unwrap().slot, second);
    }

    #[test]
    fn test_closed_scope_restores_outer_binding() {
        let mut table = SymbolTable::starting_at(1);
        table.declare("x".into(), Descriptor::Str, None).unwrap();

        table.push_scope();
        table.declare("x".into(), Descriptor::Double, None).unwrap();
        table.declare("y".into(), Descriptor::Int, None).unwrap();
        assert_eq!(table.lookup("x").unwrap().slot, 2);
        table.pop_scope();

        assert_eq!(table.lookup("x").unwrap().desc, Descriptor::Str);
        assert!(table.get("y").is_none());
        // Closed blocks keep their slots.
        assert_eq!(table.slot_count(), 5);
    }

    #[test]
    fn test_slot_overflow() {
        let mut table = SymbolTable::starting_at(Slot::MAX - 1);
        assert!(table.declare("a".into(), Descriptor::Int, None).is_ok());
        assert!(matches!(
            table.declare("b".into(), Descriptor::Int, None),
            Err(IlangError::SlotOverflow)
        ));
    }

    #[test]
    fn test_unknown_names() {
        let table = SymbolTable::default();
        assert!(matches!(table.lookup("x"), Err(IlangError::UnknownVariable(_))));

        let mut records = RecordTable::default();
        let mut fields = IndexMap::new();
        fields.insert(Name::from("x"), Descriptor::Int);
        records.insert("Point".into(), fields);
        assert_eq!(records.field("Point", "x").unwrap(), &Descriptor::Int);
        assert!(matches!(records.field("Point", "y"), Err(IlangError::UnknownField { .. })));
        assert!(matches!(records.field("Line", "x"), Err(IlangError::UnknownRecord(_))));
    }
}
