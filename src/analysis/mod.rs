pub mod dcf;
pub mod fair_price;
pub mod screener;
