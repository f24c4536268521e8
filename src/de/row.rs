use serde::{
    de::{value::StrDeserializer, DeserializeSeed, MapAccess, SeqAccess, Visitor},
    Deserializer,
};

use crate::{ElementDef, PlyError, PropertyValue, Scalar};

/// Presents a decoded record to serde as a map from property name to value,
/// so any `#[derive(Deserialize)]` struct can be filled by field name.
///
/// Properties the target type does not name are skipped by serde as usual.
pub struct RecordDeserializer<'a> {
    elem_def: &'a ElementDef,
    values: &'a [PropertyValue],
}

impl<'a> RecordDeserializer<'a> {
    pub fn new(elem_def: &'a ElementDef, values: &'a [PropertyValue]) -> Self {
        Self { elem_def, values }
    }
}

impl<'de, 'a> Deserializer<'de> for RecordDeserializer<'a> {
    type Error = PlyError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(RecordMapAccess {
            parent: self,
            current_property: 0,
        })
    }

    serde::forward_to_deserialize_any! {
        bool i8 u8 i16 u16 i32 u32 i64 u64 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

struct RecordMapAccess<'a> {
    parent: RecordDeserializer<'a>,
    current_property: usize,
}

impl<'de, 'a> MapAccess<'de> for RecordMapAccess<'a> {
    type Error = PlyError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(prop) = self.parent.elem_def.properties.get(self.current_property) else {
            return Ok(None);
        };
        seed.deserialize(StrDeserializer::<PlyError>::new(&prop.name))
            .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self
            .parent
            .values
            .get(self.current_property)
            .ok_or_else(|| PlyError::Serde("value requested before key".to_string()))?;
        self.current_property += 1;

        match value {
            PropertyValue::Scalar(scalar) => seed.deserialize(ScalarDeserializer(*scalar)),
            PropertyValue::List(items) => seed.deserialize(ListDeserializer { items }),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.parent.elem_def.properties.len() - self.current_property)
    }
}

struct ListDeserializer<'a> {
    items: &'a [Scalar],
}

impl<'de, 'a> Deserializer<'de> for ListDeserializer<'a> {
    type Error = PlyError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(ListSeqAccess {
            items: self.items.iter(),
        })
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // PLY properties are always present if defined in header
        visitor.visit_some(self)
    }

    serde::forward_to_deserialize_any! {
        bool i8 u8 i16 u16 i32 u32 f32 f64 i128 i64 u128 u64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct ListSeqAccess<'a> {
    items: std::slice::Iter<'a, Scalar>,
}

impl<'de, 'a> SeqAccess<'de> for ListSeqAccess<'a> {
    type Error = PlyError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(item) => seed.deserialize(ScalarDeserializer(*item)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct ScalarDeserializer(Scalar);

impl<'de> Deserializer<'de> for ScalarDeserializer {
    type Error = PlyError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Scalar::I8(v) => visitor.visit_i8(v),
            Scalar::U8(v) => visitor.visit_u8(v),
            Scalar::I16(v) => visitor.visit_i16(v),
            Scalar::U16(v) => visitor.visit_u16(v),
            Scalar::I32(v) => visitor.visit_i32(v),
            Scalar::U32(v) => visitor.visit_u32(v),
            Scalar::F32(v) => visitor.visit_f32(v),
            Scalar::F64(v) => visitor.visit_f64(v),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    serde::forward_to_deserialize_any! {
        bool i8 u8 i16 u16 i32 u32 f32 f64 i128 i64 u128 u64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}
