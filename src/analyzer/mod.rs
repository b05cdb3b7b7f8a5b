// Analyzer module: ranking, grouping and chart data for the comparison view,
// plus range fitting.

pub mod ranges;
pub mod ranking;

pub use ranges::{auto_fit, FitOutcome};
pub use ranking::{
    arrange, chart_points, graph_score, sort_offers, starred, ChartPoint, GroupCriterion, OfferGroup,
    SortCriterion,
};
