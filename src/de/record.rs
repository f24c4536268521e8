use crate::de::val_reader::ScalarReader;
use crate::{ElementDef, PlyError, PropertyType, PropertyValue};

/// Decodes one full record of `elem_def`. The record is only returned once
/// every property has been read, so a failure never yields partial values.
pub(crate) fn read_record<S: ScalarReader>(
    val_reader: &mut S,
    elem_def: &ElementDef,
    values: &mut Vec<PropertyValue>,
) -> Result<(), PlyError> {
    values.clear();
    val_reader.read_row_start()?;

    for prop in &elem_def.properties {
        let value = match prop.property_type {
            PropertyType::Scalar(data_type) => {
                PropertyValue::Scalar(val_reader.read_scalar(data_type)?)
            }
            PropertyType::List {
                count_type,
                data_type,
            } => {
                let count = val_reader.read_scalar(count_type)?.as_usize().map_err(|_| {
                    PlyError::invalid(format!(
                        "negative item count for list property '{}'",
                        prop.name
                    ))
                })?;
                let mut items = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    items.push(val_reader.read_scalar(data_type)?);
                }
                PropertyValue::List(items)
            }
        };
        values.push(value);
    }

    val_reader.read_row_end()
}
