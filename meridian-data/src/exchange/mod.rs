/// Binance USD-M futures public market-data wire format and stream construction.
pub mod binance;
