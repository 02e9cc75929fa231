//! Decoder trait for type-safe conversions.
//!
//! `Decoder<T, D>` converts a source `T` into a destination `D`. The
//! destination opts in through the `DecodableFrom<T>` marker, so only the
//! pairs a crate declares can be converted.
//!
//! ```no_run
//! use codec::decoder::{Decoder, DecodableFrom};
//!
//! struct Encoded(Vec<u8>);
//! struct Length(usize);
//!
//! impl DecodableFrom<Encoded> for Length {}
//!
//! impl Decoder<Encoded, Length> for Encoded {
//!     type Error = std::convert::Infallible;
//!
//!     fn decode(&self) -> Result<Length, Self::Error> {
//!         Ok(Length(self.0.len()))
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into `D`.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid representation of `D`.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
pub trait DecodableFrom<T> {}
