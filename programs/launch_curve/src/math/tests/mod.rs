mod property_tests;
mod unit_tests;
