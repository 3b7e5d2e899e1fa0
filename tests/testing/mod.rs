pub mod mock_driver;
