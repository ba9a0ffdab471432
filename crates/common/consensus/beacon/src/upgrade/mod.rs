pub mod altair;
pub mod bellatrix;
