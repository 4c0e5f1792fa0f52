pub mod fake_xdcc;
