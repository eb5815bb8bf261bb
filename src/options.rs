//! A dynamic representation of the options messages in
//! `google/protobuf/descriptor.proto`, keyed by field number.
//!
//! Interpreted options may be extension fields of types this crate has no
//! static knowledge of, so they are stored as a tree of typed values and
//! encoded by hand. Fields are kept in a sorted map so that encoding is
//! deterministic.

use std::collections::btree_map::{self, BTreeMap};

use bytes::{Buf, BufMut};
use prost::encoding::{self, DecodeContext, WireType};
use prost::{DecodeError, Message};
use prost_types::UninterpretedOption;

use crate::tag;

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct OptionSet {
    fields: BTreeMap<u32, Value>,
    uninterpreted: Vec<UninterpretedOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Sint32(i32),
    Sint64(i64),
    Fixed32(u32),
    Fixed64(u64),
    Sfixed32(i32),
    Sfixed64(i64),
    Float(f32),
    Double(f64),
    Enum(i32),
    String(String),
    Bytes(Vec<u8>),
    Message(OptionSet),
    Group(OptionSet),
    Repeated(Vec<Value>),
}

impl OptionSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.uninterpreted.is_empty()
    }

    /// Sets a singular field, replacing any previous value.
    pub fn set(&mut self, number: u32, value: Value) {
        debug_assert_ne!(number, tag::UNINTERPRETED_OPTION);
        self.fields.insert(number, value);
    }

    pub fn get(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number)
    }

    /// Appends a value to a repeated field.
    pub fn push(&mut self, number: u32, value: Value) {
        match self.fields.entry(number) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(Value::Repeated(vec![value]));
            }
            btree_map::Entry::Occupied(entry) => match entry.into_mut() {
                Value::Repeated(values) => values.push(value),
                _ => panic!("field {} is not repeated", number),
            },
        }
    }

    /// Gets a mutable reference to a singular message-typed field, inserting
    /// an empty message if it is not set.
    pub fn message_mut(&mut self, number: u32, group: bool) -> &mut OptionSet {
        let value = self.fields.entry(number).or_insert_with(|| {
            if group {
                Value::Group(OptionSet::new())
            } else {
                Value::Message(OptionSet::new())
            }
        });
        match value {
            Value::Message(set) | Value::Group(set) => set,
            _ => panic!("field {} is not a message", number),
        }
    }

    /// Appends a new element to a repeated message-typed field and returns a
    /// mutable reference to it.
    pub fn push_message(&mut self, number: u32, group: bool) -> &mut OptionSet {
        let element = if group {
            Value::Group(OptionSet::new())
        } else {
            Value::Message(OptionSet::new())
        };
        self.push(number, element);

        match self.fields.get_mut(&number) {
            Some(Value::Repeated(values)) => match values.last_mut() {
                Some(Value::Message(set) | Value::Group(set)) => set,
                _ => unreachable!(),
            },
            _ => unreachable!(),
        }
    }

    pub fn add_uninterpreted(&mut self, option: UninterpretedOption) {
        self.uninterpreted.push(option);
    }

    pub fn take_uninterpreted(&mut self) -> Vec<UninterpretedOption> {
        std::mem::take(&mut self.uninterpreted)
    }

    pub fn uninterpreted(&self) -> &[UninterpretedOption] {
        &self.uninterpreted
    }
}

fn encode_value<B>(number: u32, value: &Value, buf: &mut B)
where
    B: BufMut,
{
    match value {
        Value::Bool(value) => encoding::bool::encode(number, value, buf),
        Value::Int32(value) => encoding::int32::encode(number, value, buf),
        Value::Int64(value) => encoding::int64::encode(number, value, buf),
        Value::Uint32(value) => encoding::uint32::encode(number, value, buf),
        Value::Uint64(value) => encoding::uint64::encode(number, value, buf),
        Value::Sint32(value) => encoding::sint32::encode(number, value, buf),
        Value::Sint64(value) => encoding::sint64::encode(number, value, buf),
        Value::Fixed32(value) => encoding::fixed32::encode(number, value, buf),
        Value::Fixed64(value) => encoding::fixed64::encode(number, value, buf),
        Value::Sfixed32(value) => encoding::sfixed32::encode(number, value, buf),
        Value::Sfixed64(value) => encoding::sfixed64::encode(number, value, buf),
        Value::Float(value) => encoding::float::encode(number, value, buf),
        Value::Double(value) => encoding::double::encode(number, value, buf),
        Value::Enum(value) => encoding::int32::encode(number, value, buf),
        Value::String(value) => encoding::string::encode(number, value, buf),
        Value::Bytes(value) => encoding::bytes::encode(number, value, buf),
        Value::Message(value) => encoding::message::encode(number, value, buf),
        Value::Group(value) => encoding::group::encode(number, value, buf),
        Value::Repeated(values) => {
            for value in values {
                encode_value(number, value, buf);
            }
        }
    }
}

fn value_encoded_len(number: u32, value: &Value) -> usize {
    match value {
        Value::Bool(value) => encoding::bool::encoded_len(number, value),
        Value::Int32(value) => encoding::int32::encoded_len(number, value),
        Value::Int64(value) => encoding::int64::encoded_len(number, value),
        Value::Uint32(value) => encoding::uint32::encoded_len(number, value),
        Value::Uint64(value) => encoding::uint64::encoded_len(number, value),
        Value::Sint32(value) => encoding::sint32::encoded_len(number, value),
        Value::Sint64(value) => encoding::sint64::encoded_len(number, value),
        Value::Fixed32(value) => encoding::fixed32::encoded_len(number, value),
        Value::Fixed64(value) => encoding::fixed64::encoded_len(number, value),
        Value::Sfixed32(value) => encoding::sfixed32::encoded_len(number, value),
        Value::Sfixed64(value) => encoding::sfixed64::encoded_len(number, value),
        Value::Float(value) => encoding::float::encoded_len(number, value),
        Value::Double(value) => encoding::double::encoded_len(number, value),
        Value::Enum(value) => encoding::int32::encoded_len(number, value),
        Value::String(value) => encoding::string::encoded_len(number, value),
        Value::Bytes(value) => encoding::bytes::encoded_len(number, value),
        Value::Message(value) => encoding::message::encoded_len(number, value),
        Value::Group(value) => encoding::group::encoded_len(number, value),
        Value::Repeated(values) => values
            .iter()
            .map(|value| value_encoded_len(number, value))
            .sum(),
    }
}

impl Message for OptionSet {
    fn encode_raw<B>(&self, buf: &mut B)
    where
        B: BufMut,
        Self: Sized,
    {
        // Fields are emitted in field number order, with any remaining
        // uninterpreted options in their place at field 999.
        for (&number, value) in self.fields.range(..tag::UNINTERPRETED_OPTION) {
            encode_value(number, value, buf);
        }
        for option in &self.uninterpreted {
            encoding::message::encode(tag::UNINTERPRETED_OPTION, option, buf);
        }
        for (&number, value) in self.fields.range(tag::UNINTERPRETED_OPTION + 1..) {
            encode_value(number, value, buf);
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        for (&number, value) in &self.fields {
            len += value_encoded_len(number, value);
        }
        for option in &self.uninterpreted {
            len += encoding::message::encoded_len(tag::UNINTERPRETED_OPTION, option);
        }
        len
    }

    fn clear(&mut self) {
        self.fields.clear();
        self.uninterpreted.clear();
    }

    fn merge_field<B>(
        &mut self,
        _: u32,
        _: WireType,
        _: &mut B,
        _: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        B: Buf,
        Self: Sized,
    {
        // Descriptors are only ever built from source, never decoded.
        unimplemented!()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_field_number_order() {
        let mut options = OptionSet::new();
        options.set(51234, Value::String("hello".to_owned()));
        options.set(1, Value::Bool(true));
        options.set(23, Value::Bool(false));

        let mut buf = Vec::new();
        options.encode_raw(&mut buf);

        let mut sorted = OptionSet::new();
        sorted.set(1, Value::Bool(true));
        sorted.set(23, Value::Bool(false));
        sorted.set(51234, Value::String("hello".to_owned()));

        let mut expected = Vec::new();
        sorted.encode_raw(&mut expected);

        assert_eq!(buf, expected);
        assert_eq!(options.encoded_len(), buf.len());
    }

    #[test]
    fn repeated_values_encode_unpacked() {
        let mut options = OptionSet::new();
        options.push(3, Value::Int32(1));
        options.push(3, Value::Int32(2));

        let mut buf = Vec::new();
        options.encode_raw(&mut buf);

        // Two occurrences of field 3 with the varint wire type.
        assert_eq!(buf, vec![0x18, 0x01, 0x18, 0x02]);
    }
}
