//! Binary record codec for the linked-entity store.
//!
//! Records are self-describing enough to survive schema evolution:
//!
//! ```text
//! record  := FORMAT version:varint collection:string id:string
//!            field_count:varint field* link_count:varint link*
//! field   := tag:u8 payload
//! link    := relation:string kind:u8 collection:string (id:string | ids:string_vec)
//! ```
//!
//! Fields are written in schema declaration order. A record written at
//! revision `v` holds exactly the fields introduced at or before `v`;
//! decoding it with a newer schema fills the rest with their defaults, and
//! decoding a newer record with an older schema skips the trailing fields
//! it does not know (every field is type-tagged, so it can be skipped).

mod error;
mod primitives;
mod record;

pub use error::CodecError;
pub use primitives::{Reader, Writer, zigzag_decode, zigzag_encode};
pub use record::{decode, decode_with_schema, encode, encode_at, peek_header};

/// Leading byte of every record.
pub const FORMAT: u8 = 0x01;

/// Upper bounds applied while decoding, so corrupt lengths fail fast
/// instead of allocating.
pub mod limits {
    pub const MAX_VARINT_BYTES: usize = 10;
    pub const MAX_STRING_LEN: usize = 1 << 20;
    pub const MAX_LIST_LEN: usize = 1 << 16;
    pub const MAX_FIELDS: usize = 1024;
    pub const MAX_LINKS: usize = 1024;
}
