//! Header and record decoding against hand-written PLY data

use plykit::{PlyError, PlyFormat, PlyHeader, PlyReader, PropertyType, PropertyValue, Scalar};
use std::io::{BufReader, Cursor};

/// Decodes every record, returning (element name, values) pairs.
fn decode_all(data: impl AsRef<[u8]>) -> Result<Vec<(String, Vec<PropertyValue>)>, PlyError> {
    let mut reader = PlyReader::parse_header(Cursor::new(data.as_ref().to_vec()))?;
    let mut records = Vec::new();
    while let Some(record) = reader.decode_next_element()? {
        records.push((record.name().to_string(), record.values().to_vec()));
    }
    Ok(records)
}

fn header_error(data: &str) -> String {
    match PlyHeader::parse(&mut Cursor::new(data)) {
        Err(PlyError::MalformedHeader(msg)) => msg,
        other => panic!("expected a malformed header, got {other:?}"),
    }
}

fn f32s(values: &[PropertyValue]) -> Vec<f32> {
    values
        .iter()
        .map(|v| match v {
            PropertyValue::Scalar(Scalar::F32(f)) => *f,
            other => panic!("expected float, got {other:?}"),
        })
        .collect()
}

#[test]
fn test_basic_ascii_parsing() {
    let ply_data = r#"ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
end_header
0.0 0.0 0.0
1.0 0.0 0.0
0.5 1.0 0.0
"#;

    let reader = PlyReader::parse_header(BufReader::new(Cursor::new(ply_data))).unwrap();
    assert_eq!(reader.header().format, PlyFormat::Ascii);
    assert_eq!(reader.header().elements.len(), 1);

    let records = decode_all(ply_data).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(f32s(&records[2].1), vec![0.5, 1.0, 0.0]);
}

#[test]
fn test_greg_turk_cube() {
    let ply_data = r#"ply
format ascii 1.0
comment made by Greg Turk
comment this file is a cube
element vertex 8
property float x
property float y
property float z
element face 6
property list uchar int vertex_index
end_header
0 0 0
0 0 1
0 1 1
0 1 0
1 0 0
1 0 1
1 1 1
1 1 0
4 0 1 2 3
4 7 6 5 4
4 0 4 5 1
4 1 5 6 2
4 2 6 7 3
4 3 7 4 0
"#;

    let mut reader = PlyReader::parse_header(Cursor::new(ply_data)).unwrap();
    assert_eq!(
        reader.header().comments,
        vec!["made by Greg Turk", "this file is a cube"]
    );

    let mut vertices = 0;
    let mut faces = Vec::new();
    while let Some(record) = reader.decode_next_element().unwrap() {
        match record.name() {
            "vertex" => vertices += 1,
            "face" => faces.push(record.list("vertex_index").unwrap().to_vec()),
            other => panic!("unexpected element {other}"),
        }
    }

    assert_eq!(vertices, 8);
    assert_eq!(faces.len(), 6);
    assert_eq!(
        faces[1],
        vec![Scalar::I32(7), Scalar::I32(6), Scalar::I32(5), Scalar::I32(4)]
    );
}

#[test]
fn test_all_scalar_types() {
    let ply_data = r#"ply
format ascii 1.0
element point 1
property char a
property int8 b
property uchar c
property uint8 d
property short e
property int16 f
property uint16 g
property ushort h
property int32 i
property int j
property uint32 k
property uint l
property float32 m
property float n
property float64 o
property double p
end_header
-1 1 2 255 -3 3 4 65535 -5 5 6 4294967295 7 7 8 8
"#;

    let records = decode_all(ply_data).unwrap();
    let values = &records[0].1;
    assert_eq!(values.len(), 16);
    assert_eq!(values[0], PropertyValue::Scalar(Scalar::I8(-1)));
    assert_eq!(values[3], PropertyValue::Scalar(Scalar::U8(255)));
    assert_eq!(values[4], PropertyValue::Scalar(Scalar::I16(-3)));
    assert_eq!(values[7], PropertyValue::Scalar(Scalar::U16(65535)));
    assert_eq!(values[8], PropertyValue::Scalar(Scalar::I32(-5)));
    assert_eq!(values[11], PropertyValue::Scalar(Scalar::U32(u32::MAX)));
    assert_eq!(values[13], PropertyValue::Scalar(Scalar::F32(7.0)));
    assert_eq!(values[15], PropertyValue::Scalar(Scalar::F64(8.0)));
}

#[test]
fn test_scientific_notation() {
    let ply_data = r#"ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
end_header
1.5e2 -2.3e-1 4.7E+3
6.8e-4 9.1E2 -3.2e+1
"#;

    let records = decode_all(ply_data).unwrap();
    let first = f32s(&records[0].1);
    assert_eq!(first[0], 150.0);
    assert!((first[1] - (-0.23)).abs() < 0.001);
    assert_eq!(first[2], 4700.0);
}

#[test]
fn test_blank_lines_and_whitespace() {
    let ply_data = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nend_header\n\n   1.0    2.0\t3.0  \n\n4.0 5.0 6.0";

    let records = decode_all(ply_data).unwrap();
    assert_eq!(f32s(&records[0].1), vec![1.0, 2.0, 3.0]);
    assert_eq!(f32s(&records[1].1), vec![4.0, 5.0, 6.0]);
}

#[test]
fn test_parse_rn() {
    let ply_data = "ply\r\nformat ascii 1.0\r\nelement vertex 1\r\nproperty float x\r\nproperty float y\r\nproperty float z\r\nend_header\r\n0 0 1\r\n";
    let records = decode_all(ply_data).unwrap();
    assert_eq!(f32s(&records[0].1), vec![0.0, 0.0, 1.0]);
}

#[test]
fn test_binary_little_endian() {
    let mut binary_data = b"ply\nformat binary_little_endian 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n".to_vec();

    for v in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
        binary_data.extend_from_slice(&v.to_le_bytes());
    }
    binary_data.push(2);
    binary_data.extend_from_slice(&0i32.to_le_bytes());
    binary_data.extend_from_slice(&1i32.to_le_bytes());

    let records = decode_all(&binary_data).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(f32s(&records[1].1), vec![4.0, 5.0, 6.0]);
    assert_eq!(
        records[2].1,
        vec![PropertyValue::List(vec![Scalar::I32(0), Scalar::I32(1)])]
    );
}

#[test]
fn test_binary_big_endian() {
    let mut binary_data = b"ply\nformat binary_big_endian 1.0\nelement vertex 1\nproperty double x\nproperty ushort flags\nend_header\n".to_vec();
    binary_data.extend_from_slice(&1.5f64.to_be_bytes());
    binary_data.extend_from_slice(&0x0102u16.to_be_bytes());

    let records = decode_all(&binary_data).unwrap();
    assert_eq!(
        records[0].1,
        vec![
            PropertyValue::Scalar(Scalar::F64(1.5)),
            PropertyValue::Scalar(Scalar::U16(0x0102)),
        ]
    );
}

#[test]
fn test_binary_payload_with_newline_bytes() {
    // 0x0a inside the payload must not be mistaken for a header line.
    let mut binary_data = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty uint id\nend_header\n".to_vec();
    binary_data.extend_from_slice(&0x0a0a0a0au32.to_le_bytes());

    let records = decode_all(&binary_data).unwrap();
    assert_eq!(
        records[0].1,
        vec![PropertyValue::Scalar(Scalar::U32(0x0a0a0a0a))]
    );
}

#[test]
fn test_empty_elements() {
    let ply_data = r#"ply
format ascii 1.0
element vertex 0
property float x
element face 0
property list uchar uint vertex_indices
end_header
"#;

    assert!(decode_all(ply_data).unwrap().is_empty());
}

#[test]
fn test_extra_vertex_properties_are_decoded() {
    let ply_data = r#"ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
property float confidence
property float intensity
end_header
0.1 0.2 0.3 0.9 0.5
1.1 1.2 1.3 0.8 0.4
"#;

    let mut reader = PlyReader::parse_header(Cursor::new(ply_data)).unwrap();
    let first = reader.decode_next_element().unwrap().unwrap();
    assert_eq!(first.position("x", "y", "z").unwrap(), [
        0.1f32 as f64,
        0.2f32 as f64,
        0.3f32 as f64
    ]);
    let second = reader.decode_next_element().unwrap().unwrap();
    assert_eq!(second.scalar("x"), Some(Scalar::F32(1.1)));
    assert_eq!(second.scalar("intensity"), Some(Scalar::F32(0.4)));
}

#[test]
fn test_error_incomplete_data() {
    let ply_data = r#"ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
end_header
1.0 2.0 3.0
4.0 5.0
"#;

    assert!(matches!(
        decode_all(ply_data),
        Err(PlyError::TruncatedData(_))
    ));
}

#[test]
fn test_error_missing_records() {
    let ply_data = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nend_header\n1\n2\n";
    assert!(matches!(
        decode_all(ply_data),
        Err(PlyError::TruncatedData(_))
    ));

    let mut binary = b"ply\nformat binary_big_endian 1.0\nelement vertex 2\nproperty float x\nend_header\n".to_vec();
    binary.extend_from_slice(&1.0f32.to_be_bytes());
    binary.extend_from_slice(&[0x3f, 0x80]);
    assert!(matches!(
        decode_all(&binary),
        Err(PlyError::TruncatedData(_))
    ));
}

#[test]
fn test_error_short_ascii_list() {
    let ply_data = "ply\nformat ascii 1.0\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n4 0 1 2\n";
    assert!(matches!(
        decode_all(ply_data),
        Err(PlyError::TruncatedData(_))
    ));
}

#[test]
fn test_error_invalid_values() {
    let cases = [
        "property uchar v\nend_header\n256\n",
        "property char v\nend_header\n-129\n",
        "property int v\nend_header\n1.5\n",
        "property float v\nend_header\nabc\n",
        "property float v\nend_header\n1.0 2.0\n",
        "property list char int v\nend_header\n-2 1 1\n",
    ];
    for case in cases {
        let data = format!("ply\nformat ascii 1.0\nelement vertex 1\n{case}");
        assert!(
            matches!(decode_all(&data), Err(PlyError::InvalidValue(_))),
            "expected invalid value for {case:?}"
        );
    }
}

#[test]
fn test_header_list_property() {
    let header = PlyHeader::parse(&mut Cursor::new(
        "ply\nformat ascii 1.0\nelement face 0\nproperty list ushort uint vertex_indices\nend_header\n",
    ))
    .unwrap();
    let face = header.get_element("face").unwrap();
    assert!(matches!(
        face.properties[0].property_type,
        PropertyType::List { .. }
    ));
    assert!(header.has_element("face"));
    assert!(!header.has_element("vertex"));
}

#[test]
fn test_header_errors() {
    assert!(header_error("format ascii 1.0\nend_header\n").contains("ply"));
    assert!(header_error("").contains("Empty"));
    header_error("ply\nformat ascii 2.0\nend_header\n");
    header_error("ply\nformat binary_middle_endian 1.0\nend_header\n");
    header_error("ply\nformat ascii\nend_header\n");
    header_error("ply\nelement vertex 1\nproperty float x\nend_header\n");
    header_error("ply\nformat ascii 1.0\nproperty float x\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement vertex -1\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement vertex\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement vertex 1\nproperty float\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement vertex 1\nproperty vec3 x\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement f 1\nproperty list float int v\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement f 1\nproperty list uchar v\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement vertex 1\nproperty float x y\nend_header\n");
    header_error("ply\nformat ascii 1.0\nbogus line\nend_header\n");
    header_error("ply\nformat ascii 1.0\nelement vertex 1\n");
    header_error("ply\nformat ascii 1.0\nformat ascii 1.0\nend_header\n");
}

#[test]
fn test_missing_magic_fails_before_decoding() {
    let data = b"format binary_little_endian 1.0\nelement vertex 1\nproperty float x\nend_header\n\0\0\0\0";
    assert!(matches!(
        PlyReader::parse_header(Cursor::new(&data[..])),
        Err(PlyError::MalformedHeader(_))
    ));
}

#[test]
fn test_non_ascii_header() {
    let data = b"ply\nformat ascii 1.0\ncomment \xff\xfe\nend_header\n";
    assert!(matches!(
        PlyHeader::parse(&mut Cursor::new(&data[..])),
        Err(PlyError::MalformedHeader(_))
    ));
}

#[test]
fn test_utf8_comment_is_kept() {
    let data = "ply\nformat ascii 1.0\ncomment scanned in Zürich\nend_header\n";
    let reader = PlyReader::parse_header(Cursor::new(data)).unwrap();
    assert_eq!(reader.header().comments, vec!["scanned in Zürich".to_string()]);
}

#[test]
fn test_non_utf8_data_line_is_invalid_value() {
    let data = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n1\xff\n";
    assert!(matches!(decode_all(&data[..]), Err(PlyError::InvalidValue(_))));
}
