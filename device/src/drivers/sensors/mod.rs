pub mod tcn75a;
