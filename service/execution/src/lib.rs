mod aggregate;

#[rustfmt::skip]
pub use {
    aggregate::StatisticsAggregateServiceImpl,
};
