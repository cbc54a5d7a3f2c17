//! Genres are kept in a single column as a JSON array of strings.
//!
//! An empty list is stored as NULL, not as `[]`, and a NULL column reads back
//! as an empty list.

use sqlx::{
    Decode, Sqlite, Type, TypeInfo as _, ValueRef as _,
    error::BoxDynError,
    sqlite::{SqliteTypeInfo, SqliteValueRef},
};

use crate::error::Result;

/// Raw genres column value, as handed over by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreScalar {
    Text(String),
    Bytes(Vec<u8>),
}

impl GenreScalar {
    fn as_bytes(&self) -> &[u8] {
        match self {
            GenreScalar::Text(s) => s.as_bytes(),
            GenreScalar::Bytes(b) => b.as_slice(),
        }
    }
}

impl Type<Sqlite> for GenreScalar {
    fn type_info() -> SqliteTypeInfo {
        <str as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <str as Type<Sqlite>>::compatible(ty) || <[u8] as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for GenreScalar {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.type_info().name() == "BLOB" {
            Ok(GenreScalar::Bytes(<Vec<u8> as Decode<Sqlite>>::decode(
                value,
            )?))
        } else {
            Ok(GenreScalar::Text(<String as Decode<Sqlite>>::decode(value)?))
        }
    }
}

pub fn encode(genres: &[String]) -> Result<Option<String>> {
    if genres.is_empty() {
        return Ok(None);
    }
    let json = serde_json::to_string(genres)?;
    Ok(Some(json))
}

pub fn decode(scalar: Option<GenreScalar>) -> Result<Vec<String>> {
    match scalar {
        None => Ok(Vec::new()),
        Some(scalar) => {
            let genres = serde_json::from_slice(scalar.as_bytes())?;
            Ok(genres)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn genres(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_roundtrip_keeps_order() {
        let original = genres(&["drama", "noir"]);
        let encoded = encode(&original).unwrap();
        assert_eq!(encoded.as_deref(), Some(r#"["drama","noir"]"#));
        let decoded = decode(encoded.map(GenreScalar::Text)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_empty_is_null() {
        assert_eq!(encode(&[]).unwrap(), None);
        assert!(decode(None).unwrap().is_empty());
    }

    #[test]
    fn test_bytes_and_text_decode_same() {
        let text = decode(Some(GenreScalar::Text(r#"["sci-fi","action"]"#.into()))).unwrap();
        let bytes = decode(Some(GenreScalar::Bytes(
            br#"["sci-fi","action"]"#.to_vec(),
        )))
        .unwrap();
        assert_eq!(text, bytes);
        assert_eq!(text, genres(&["sci-fi", "action"]));
    }

    #[test]
    fn test_malformed_fails() {
        let res = decode(Some(GenreScalar::Text("drama,noir".into())));
        assert!(matches!(res, Err(Error::GenreDecode(_))));

        let res = decode(Some(GenreScalar::Bytes(b"[1, 2]".to_vec())));
        assert!(matches!(res, Err(Error::GenreDecode(_))));
    }

    #[test]
    fn test_unicode_survives() {
        let original = genres(&["комедия", "\"quoted\""]);
        let decoded = decode(encode(&original).unwrap().map(GenreScalar::Text)).unwrap();
        assert_eq!(decoded, original);
    }
}
