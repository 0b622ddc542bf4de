mod clock_replacer_test;
mod tuple_test;
