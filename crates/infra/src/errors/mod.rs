//! Infrastructure error conversions

mod conversions;

pub(crate) use conversions::transport_error;
