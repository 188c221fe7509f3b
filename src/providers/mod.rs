pub mod currency_converter_api;
pub mod util;

pub use currency_converter_api::CurrencyConverterApi;
