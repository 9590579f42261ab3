pub mod data_uri_decoder;
