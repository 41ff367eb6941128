// Delimiter configuration for one parser instance

use thiserror::Error;

/// Hive text-table field delimiter (`^A`).
pub const DEFAULT_FIELD_DELIM: u8 = 0x01;
/// Hive text-table collection item delimiter (`^B`).
pub const DEFAULT_COLLECTION_ITEM_DELIM: u8 = 0x02;
pub const DEFAULT_TUPLE_DELIM: u8 = b'\n';

/// Upper bound on partition-key columns.
pub const MAX_PARTITION_KEYS: usize = 1 << 16;

/// Rejected delimiter combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field and tuple delimiter are both {0:#04x}")]
    FieldIsTupleDelimiter(u8),
    #[error("collection item delimiter {0:#04x} is also the tuple delimiter")]
    CollectionIsTupleDelimiter(u8),
    #[error("escape character {0:#04x} is also a delimiter")]
    EscapeIsDelimiter(u8),
    #[error("{0} partition keys exceeds the limit of 65536")]
    TooManyPartitionKeys(usize),
}

/// Single-byte delimiters, optional escape and partition-key count.
///
/// Fixed for the lifetime of a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub field_delim: u8,
    pub tuple_delim: u8,
    pub collection_item_delim: u8,
    /// `None` selects the escape-free scan path.
    pub escape_char: Option<u8>,
    /// Table columns that come from the partition path, not the file.
    pub num_partition_keys: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            field_delim: DEFAULT_FIELD_DELIM,
            tuple_delim: DEFAULT_TUPLE_DELIM,
            collection_item_delim: DEFAULT_COLLECTION_ITEM_DELIM,
            escape_char: None,
            num_partition_keys: 0,
        }
    }
}

impl ParserConfig {
    /// Field and tuple delimiters; the collection item delimiter defaults to
    /// the field delimiter.
    pub fn new(field_delim: u8, tuple_delim: u8) -> Self {
        ParserConfig {
            field_delim,
            tuple_delim,
            collection_item_delim: field_delim,
            escape_char: None,
            num_partition_keys: 0,
        }
    }

    pub fn with_collection_item_delim(mut self, delim: u8) -> Self {
        self.collection_item_delim = delim;
        self
    }

    pub fn with_escape(mut self, escape: Option<u8>) -> Self {
        self.escape_char = escape;
        self
    }

    pub fn with_partition_keys(mut self, count: usize) -> Self {
        self.num_partition_keys = count;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_partition_keys > MAX_PARTITION_KEYS {
            return Err(ConfigError::TooManyPartitionKeys(self.num_partition_keys));
        }
        if self.field_delim == self.tuple_delim {
            return Err(ConfigError::FieldIsTupleDelimiter(self.field_delim));
        }
        if self.collection_item_delim == self.tuple_delim {
            return Err(ConfigError::CollectionIsTupleDelimiter(
                self.collection_item_delim,
            ));
        }
        if let Some(esc) = self.escape_char {
            if self.is_delimiter(esc) {
                return Err(ConfigError::EscapeIsDelimiter(esc));
            }
        }
        Ok(())
    }

    /// Needles for the delimiter window search.
    #[inline]
    pub fn delimiters(&self) -> [u8; 3] {
        [self.field_delim, self.tuple_delim, self.collection_item_delim]
    }

    #[inline]
    pub fn is_delimiter(&self, byte: u8) -> bool {
        byte == self.field_delim || byte == self.tuple_delim || byte == self.collection_item_delim
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hive_text() {
        let cfg = ParserConfig::default();
        assert_eq!(cfg.delimiters(), [0x01, b'\n', 0x02]);
        assert_eq!(cfg.escape_char, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_collection_defaults_to_field() {
        let cfg = ParserConfig::new(b',', b'\n');
        assert_eq!(cfg.collection_item_delim, b',');
        assert!(cfg.validate().is_ok(), "collection may share the field delimiter");
    }

    #[test]
    fn test_rejects_colliding_delimiters() {
        assert_eq!(
            ParserConfig::new(b'\n', b'\n').validate(),
            Err(ConfigError::FieldIsTupleDelimiter(b'\n'))
        );
        assert_eq!(
            ParserConfig::new(b',', b'\n')
                .with_collection_item_delim(b'\n')
                .validate(),
            Err(ConfigError::CollectionIsTupleDelimiter(b'\n'))
        );
        assert_eq!(
            ParserConfig::new(b',', b'\n')
                .with_escape(Some(b','))
                .validate(),
            Err(ConfigError::EscapeIsDelimiter(b','))
        );
    }

    #[test]
    fn test_rejects_absurd_partition_key_count() {
        let cfg = ParserConfig::new(b',', b'\n');
        assert!(cfg.with_partition_keys(MAX_PARTITION_KEYS).validate().is_ok());
        assert_eq!(
            cfg.with_partition_keys(usize::MAX).validate(),
            Err(ConfigError::TooManyPartitionKeys(usize::MAX)),
            "a count near usize::MAX would overflow the column index"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::EscapeIsDelimiter(b',');
        assert_eq!(err.to_string(), "escape character 0x2c is also a delimiter");
    }
}
