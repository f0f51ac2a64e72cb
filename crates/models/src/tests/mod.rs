/// Field validation and lenient parsing
pub mod validation_tests;
