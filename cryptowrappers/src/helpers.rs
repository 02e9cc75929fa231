//! Binary/text conversion through the services layer.
//!
//! Every function here follows the same shape: ask the services layer for
//! the output length, allocate exactly that much, call again to fill.

use certsvc::{CertServices, Encoding, EncodingType, FormatFlags, StringFormat};
use tracing::trace;

use crate::error::{Error, Result};

/// Runs `call` once with no buffer to learn the length, then with a buffer
/// of that length. The result is truncated to what the second call wrote.
pub fn query_then_fill<T, E>(
    mut call: impl FnMut(Option<&mut [T]>, &mut usize) -> std::result::Result<(), E>,
) -> std::result::Result<Vec<T>, E>
where
    T: Default + Clone,
{
    query_then_fill_with(&mut call).map(|(buf, ())| buf)
}

/// [`query_then_fill`] for calls that return a value besides the buffer;
/// the value of the second call is kept.
pub fn query_then_fill_with<T, R, E>(
    mut call: impl FnMut(Option<&mut [T]>, &mut usize) -> std::result::Result<R, E>,
) -> std::result::Result<(Vec<T>, R), E>
where
    T: Default + Clone,
{
    let mut len = 0;
    call(None, &mut len)?;
    let mut buf = vec![T::default(); len];
    let value = call(Some(&mut buf[..]), &mut len)?;
    buf.truncate(len);
    Ok((buf, value))
}

/// Encodes `data` as text.
pub fn binary_to_text<S>(services: &S, data: &[u8], format: StringFormat) -> Result<String>
where
    S: CertServices + ?Sized,
{
    let bytes = query_then_fill(|out, len| services.binary_to_string(data, format, out, len))
        .map_err(Error::Conversion)?;
    trace!(len = data.len(), format = format.bits(), "binary to text");
    String::from_utf8(bytes)
        .map_err(|e| Error::Conversion(certsvc::Error::InvalidData(e.to_string())))
}

/// Output of [`text_to_binary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToBinary {
    pub bytes: Vec<u8>,
    /// Characters skipped before the encoded payload started.
    pub skipped: usize,
    /// The concrete format that matched.
    pub detected: Encoding,
}

/// Decodes `text` according to `format`.
pub fn text_to_binary<S>(services: &S, text: &str, format: StringFormat) -> Result<TextToBinary>
where
    S: CertServices + ?Sized,
{
    let (bytes, info) =
        query_then_fill_with(|out, len| services.string_to_binary(text, format, out, len))
            .map_err(Error::Conversion)?;
    trace!(len = bytes.len(), detected = ?info.format, "text to binary");
    Ok(TextToBinary {
        bytes,
        skipped: info.skipped,
        detected: info.format,
    })
}

/// Renders an encoded structure (`struct_type` is its OID, e.g.
/// `"2.5.29.15"` for key usage) as display text.
pub fn format_object<S>(
    services: &S,
    encoding: EncodingType,
    flags: FormatFlags,
    struct_type: Option<&str>,
    encoded: &[u8],
) -> Result<String>
where
    S: CertServices + ?Sized,
{
    let units = query_then_fill(|out, len| {
        services.format_object(encoding, flags, struct_type, encoded, out, len)
    })
    .map_err(Error::Format)?;
    String::from_utf16(&units)
        .map_err(|e| Error::Format(certsvc::Error::InvalidData(e.to_string())))
}
