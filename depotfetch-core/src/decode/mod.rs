//! Format decoders.
//!
//! Each decoder is a pure, synchronous function over bytes or text with no
//! shared state. Adapters chain them per source:
//!
//! | decoder            | input                          | output                     |
//! |--------------------|--------------------------------|----------------------------|
//! | [`dual_aes`]       | IV-wrapped AES-CBC ciphertext  | plaintext bytes            |
//! | [`xor`]            | any bytes                      | bytes                      |
//! | [`record`]         | gob-encoded app record         | [`record::AppRecord`]      |
//! | [`container`]      | `.st` container                | script text                |
//! | [`script`]         | script text                    | key and manifest pins      |
//! | [`keyvalues`]      | `Key.vdf` text                 | depot keys                 |

pub mod container;
pub mod dual_aes;
pub mod keyvalues;
pub mod record;
pub mod script;
pub mod xor;
