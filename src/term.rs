// Term building utilities for converting scan results to Elixir terms

use crate::core::FieldIndex;
use rustler::{Encoder, Env, NewBinary, Term};
use std::borrow::Cow;

fn binary_term<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Convert owned rows to Elixir term (for streaming/parallel scans)
pub fn owned_rows_to_term<'a>(env: Env<'a>, rows: Vec<Vec<Vec<u8>>>) -> Term<'a> {
    // Build list in reverse (efficient for cons lists)
    let mut list = Term::list_new_empty(env);

    for row in rows.into_iter().rev() {
        let mut row_term = Term::list_new_empty(env);
        for field in row.iter().rev() {
            row_term = row_term.list_prepend(binary_term(env, field));
        }
        list = list.list_prepend(row_term);
    }

    list
}

/// Convert Cow-based rows to Elixir term (unescaped fields are owned)
pub fn cow_rows_to_term<'a>(env: Env<'a>, rows: Vec<Vec<Cow<'_, [u8]>>>) -> Term<'a> {
    let mut list = Term::list_new_empty(env);

    for row in rows.into_iter().rev() {
        let mut row_term = Term::list_new_empty(env);
        for field in row.iter().rev() {
            row_term = row_term.list_prepend(binary_term(env, field.as_ref()));
        }
        list = list.list_prepend(row_term);
    }

    list
}

/// Convert a field index to `{row_ends, [{start, len}]}`.
///
/// `len` keeps its sign: negative marks a field containing escapes.
pub fn index_to_term<'a>(env: Env<'a>, index: &FieldIndex) -> Term<'a> {
    let mut fields = Term::list_new_empty(env);
    for field in index.fields.iter().rev() {
        fields = fields.list_prepend((field.start, field.len as i64).encode(env));
    }
    (index.row_ends.encode(env), fields).encode(env)
}
