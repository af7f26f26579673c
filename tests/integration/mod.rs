mod pipeline_test;
mod postgres_test;
