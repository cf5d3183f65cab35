//! Views computed from the merged agency list.
//!
//! Every function here is pure: it borrows the records and returns new
//! collections of references, leaving the source slice untouched.

pub mod filter;
pub mod groups;
pub mod series;

pub use filter::{
    active_agencies, departments, filter_agencies, inactive_agencies, related_agencies,
    search_suggestions, AgencyFilter, SortOrder, StatusFilter,
};
pub use groups::{
    cofog_name, dashboard_stats, department_stats, group_agencies, region_stats, AgencyGroup,
    DashboardStats, DepartmentSort, DepartmentStats, GroupBy, Region,
};
pub use series::{
    agencies_in_year, agency_count_series, fte_series, total_fte_series, YearAgencies, YearPoint,
};
