//! Reference-model equivalence drivers shared by the proptest suite and the fuzz targets.

use std::prelude::v1::*;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{AugmentedMap, Error, SubtreeSize, TreeList};

/// A position that is usually, but not always, in bounds.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Position {
    /// Taken modulo the current length.
    Within(usize),
    /// Used as is.
    Raw(usize),
}

impl Position {
    fn resolve(self, len: usize) -> usize {
        match self {
            Position::Within(idx) => idx % len.max(1),
            Position::Raw(idx) => idx,
        }
    }
}

proptest::prop_compose! {
    fn within_strategy()(
        index in 0usize..1000,
    ) -> Position {
        Position::Within(index)
    }
}

proptest::prop_compose! {
    fn raw_strategy()(
        index in 0usize..64,
    ) -> Position {
        Position::Raw(index)
    }
}

fn position_strategy() -> impl Strategy<Value = Position> {
    proptest::prop_oneof![3 => within_strategy(), 1 => raw_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ListOp {
    Push(u8),
    Get(Position),
    Remove(Position),
    RemoveItem(u8),
    IndexOf(u8),
    LastIndexOf(u8),
    Clear,
}

pub fn list_op_strategy() -> impl Strategy<Value = ListOp> {
    proptest::prop_oneof![
        8 => proptest::num::u8::ANY.prop_map(ListOp::Push),
        3 => position_strategy().prop_map(ListOp::Get),
        4 => position_strategy().prop_map(ListOp::Remove),
        1 => proptest::num::u8::ANY.prop_map(ListOp::RemoveItem),
        1 => proptest::num::u8::ANY.prop_map(ListOp::IndexOf),
        1 => proptest::num::u8::ANY.prop_map(ListOp::LastIndexOf),
        1 => Just(ListOp::Clear),
    ]
}

/// Replays `ops` against a [`TreeList`] and a `Vec`, asserting identical results at every step.
pub fn run_vec_equivalence(ops: Vec<ListOp>) {
    let mut vec: Vec<u8> = Vec::new();
    let mut list: TreeList<u8> = TreeList::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        match op {
            ListOp::Push(value) => {
                vec.push(value);
                list.push(value);

                assert_eq!(list.get(vec.len() - 1), Ok(&value), "Op #{op_id}: {op:?}");
            }

            ListOp::Get(pos) => {
                let index = pos.resolve(vec.len());

                let from_vec = vec.get(index).ok_or(Error::IndexOutOfRange {
                    index,
                    len: vec.len(),
                });
                let from_list = list.get(index);

                assert_eq!(from_vec, from_list, "Op #{op_id}: {op:?}");
            }

            ListOp::Remove(pos) => {
                let index = pos.resolve(vec.len());

                let from_vec = (index < vec.len()).then(|| vec.remove(index));
                let from_list = list.remove(index);

                assert_eq!(from_vec, from_list, "Op #{op_id}: {op:?}");
            }

            ListOp::RemoveItem(value) => {
                let from_vec = match vec.iter().position(|&v| v == value) {
                    Some(index) => {
                        vec.remove(index);
                        true
                    }
                    None => false,
                };
                let from_list = list.remove_item(&value);

                assert_eq!(from_vec, from_list, "Op #{op_id}: {op:?}");
            }

            ListOp::IndexOf(value) => {
                let from_vec = vec.iter().position(|&v| v == value);
                let from_list = list.index_of(&value);

                assert_eq!(from_vec, from_list, "Op #{op_id}: {op:?}");
            }

            ListOp::LastIndexOf(value) => {
                let from_vec = vec.iter().rposition(|&v| v == value);
                let from_list = list.last_index_of(&value);

                assert_eq!(from_vec, from_list, "Op #{op_id}: {op:?}");
            }

            ListOp::Clear => {
                vec.clear();
                list.clear();
            }
        }

        list.assert_invariants();
        assert_eq!(vec.len(), list.len());
        assert!(vec.iter().eq(list.iter()));
        assert_eq!(vec, list.to_vec());
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum MapOp {
    Insert(u8),
    Get(u8),
    Remove(u8),
    GetByRank(Position),
    RemoveByRank(Position),
    PopFirst,
}

pub fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    // Keys are drawn from a small range so that duplicates are common.
    let key = || 0u8..16;

    proptest::prop_oneof![
        6 => key().prop_map(MapOp::Insert),
        2 => key().prop_map(MapOp::Get),
        3 => key().prop_map(MapOp::Remove),
        2 => position_strategy().prop_map(MapOp::GetByRank),
        3 => position_strategy().prop_map(MapOp::RemoveByRank),
        1 => Just(MapOp::PopFirst),
    ]
}

/// Replays `ops` against an [`AugmentedMap`] with rank augmentation and a sorted `Vec`.
///
/// Each inserted value is a sequence number, so the model also checks that entries with equal
/// keys stay in insertion order.
pub fn run_sorted_equivalence(ops: Vec<MapOp>) {
    let mut sorted: Vec<(u8, u32)> = Vec::new();
    let mut map: AugmentedMap<u8, u32, SubtreeSize> = AugmentedMap::new();

    for (op_id, (op, seq)) in ops.into_iter().zip(0u32..).enumerate() {
        match op {
            MapOp::Insert(key) => {
                // Equal keys sort by insertion, so the new entry goes after all of them.
                let index = sorted.partition_point(|&(k, _)| k <= key);
                sorted.insert(index, (key, seq));
                map.insert(key, seq);
            }

            MapOp::Get(key) => {
                let in_model = sorted.iter().any(|&(k, _)| k == key);
                let from_map = map.get(&key);

                assert_eq!(in_model, from_map.is_some(), "Op #{op_id}: {op:?}");

                // Whichever entry the search path reaches, it must be one of the model's.
                if let Some(&value) = from_map {
                    assert!(sorted.contains(&(key, value)), "Op #{op_id}: {op:?}");
                }
            }

            MapOp::Remove(key) => {
                let in_model = sorted.iter().any(|&(k, _)| k == key);
                let from_map = map.remove(&key);

                assert_eq!(in_model, from_map.is_some(), "Op #{op_id}: {op:?}");

                if let Some(entry) = from_map {
                    let index = sorted
                        .iter()
                        .position(|&e| e == entry)
                        .expect("removed entry missing from model");
                    sorted.remove(index);
                }
            }

            MapOp::GetByRank(pos) => {
                let index = pos.resolve(sorted.len());

                let from_model = sorted.get(index).copied();
                let from_map = map.get_by_property(index + 1).map(|(&k, &v)| (k, v));

                assert_eq!(from_model, from_map, "Op #{op_id}: {op:?}");
            }

            MapOp::RemoveByRank(pos) => {
                let index = pos.resolve(sorted.len());

                let from_model = (index < sorted.len()).then(|| sorted.remove(index));
                let from_map = map.remove_by_property(index + 1);

                assert_eq!(from_model, from_map, "Op #{op_id}: {op:?}");
            }

            MapOp::PopFirst => {
                let from_model = (!sorted.is_empty()).then(|| sorted.remove(0));
                let from_map = map.pop_first();

                assert_eq!(from_model, from_map, "Op #{op_id}: {op:?}");
            }
        }

        map.assert_invariants();
        assert_eq!(sorted.len(), map.len());
        assert!(sorted.iter().copied().eq(map.iter().map(|(&k, &v)| (k, v))));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    MoveNext,
    MovePrev,
    Remove,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        3 => Just(CursorOp::MoveNext),
        2 => Just(CursorOp::MovePrev),
        1 => Just(CursorOp::Remove),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| value(u))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

/// Drives a [`CursorMut`](crate::CursorMut) and an index into a `Vec` in lockstep.
///
/// After the first successful removal both sides are finished: the cursor must reject every
/// further operation as invalid.
pub fn run_cursor_equivalence(values: Vec<u32>, ops: Vec<CursorOp>) {
    let mut vec = values.clone();
    let mut list: TreeList<u32> = values.into_iter().collect();

    let len = vec.len();
    let mut index = 0;
    let mut last = None;
    let mut removed = false;

    {
        let mut curs = list.cursor_mut();

        for op in ops {
            if removed {
                let result = match op {
                    CursorOp::MoveNext => curs.move_next().map(drop),
                    CursorOp::MovePrev => curs.move_prev().map(drop),
                    CursorOp::Remove => curs.remove().map(drop),
                };

                assert_eq!(result, Err(Error::InvalidIterator));
                assert_eq!(curs.next_index(), Err(Error::InvalidIterator));
                assert_eq!(curs.prev_index(), Err(Error::InvalidIterator));
                continue;
            }

            match op {
                CursorOp::MoveNext => {
                    let v = (index < len).then(|| {
                        index += 1;
                        last = Some(index - 1);
                        vec[index - 1]
                    });
                    let c = curs.move_next().ok().copied();

                    assert_eq!(v, c);
                }

                CursorOp::MovePrev => {
                    let v = (index > 0).then(|| {
                        index -= 1;
                        last = Some(index);
                        vec[index]
                    });
                    let c = curs.move_prev().ok().copied();

                    assert_eq!(v, c);
                }

                CursorOp::Remove => {
                    let v = last.map(|i| vec.remove(i));
                    let c = curs.remove().ok();

                    assert_eq!(v, c);
                    removed = v.is_some();
                }
            }

            if !removed {
                assert_eq!(Ok(index), curs.next_index());
                assert_eq!(Ok(index.checked_sub(1)), curs.prev_index());
            }
        }
    }

    list.assert_invariants();
    assert!(vec.iter().eq(list.iter()));
}
