//! Command-line parsing and the plain-text views behind each command.

use anyhow::{anyhow, bail, Context, Result};

use myndigheter_core::derived::{
    agencies_in_year, agency_count_series, cofog_name, dashboard_stats, department_stats,
    filter_agencies, group_agencies, region_stats, related_agencies, search_suggestions,
    total_fte_series, AgencyFilter, DepartmentSort, GroupBy, SortOrder, StatusFilter,
};
use myndigheter_core::utils::{format_number, format_optional, truncate_string};
use myndigheter_core::{AgencyRecord, CacheInfo};

/// Column width for agency names in tables
const NAME_WIDTH: usize = 44;

/// Column width for department names in tables
const DEPARTMENT_WIDTH: usize = 32;

pub const USAGE: &str = "\
Usage: myndigheter <command> [options]

Commands:
  list [--search Q] [--status all|active|inactive] [--department D]
       [--sort name|employees|start] [--json]
  show NAME [--json]
  departments [--sort name|count|employees]
  groups department|structure|cofog|region
  regions
  year YYYY
  stats
  series FROM TO
  cache-info
  refresh
  clear-cache

Environment:
  RUST_LOG                      log filter (default: warn)
  MYNDIGHETER_LOG_DIR           also write daily log files here
  MYNDIGHETER_BASE_URL          dataset location
  MYNDIGHETER_CACHE_TTL_HOURS   cache lifetime in hours";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List { filter: AgencyFilter, json: bool },
    Show { name: String, json: bool },
    Departments { sort: DepartmentSort },
    Groups { by: GroupBy },
    Regions,
    Year { year: i32 },
    Stats,
    Series { from: i32, to: i32 },
    CacheInfo,
    Refresh,
    ClearCache,
    Help,
}

impl Command {
    /// Parse arguments after the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let command = match name.as_str() {
            "list" => parse_list(rest)?,
            "show" => {
                let json = rest.iter().any(|a| a == "--json");
                let name: Vec<&str> = rest
                    .iter()
                    .filter(|a| *a != "--json")
                    .map(String::as_str)
                    .collect();
                if name.is_empty() {
                    bail!("show: missing agency name");
                }
                Command::Show {
                    name: name.join(" "),
                    json,
                }
            }
            "departments" => {
                let sort = match option_value(rest, "--sort")? {
                    None | Some("name") => DepartmentSort::Name,
                    Some("count") => DepartmentSort::Count,
                    Some("employees") => DepartmentSort::Employees,
                    Some(other) => bail!("departments: unknown sort '{}'", other),
                };
                Command::Departments { sort }
            }
            "groups" => {
                let by = match rest.first().map(String::as_str) {
                    Some("department") => GroupBy::Department,
                    Some("structure") => GroupBy::Structure,
                    Some("cofog") => GroupBy::Cofog,
                    Some("region") => GroupBy::Region,
                    Some(other) => bail!("groups: unknown grouping '{}'", other),
                    None => bail!("groups: missing grouping"),
                };
                Command::Groups { by }
            }
            "regions" => Command::Regions,
            "year" => Command::Year {
                year: parse_year(rest.first())?,
            },
            "stats" => Command::Stats,
            "series" => {
                let from = parse_year(rest.first())?;
                let to = parse_year(rest.get(1))?;
                if from > to {
                    bail!("series: FROM must not be after TO");
                }
                Command::Series { from, to }
            }
            "cache-info" => Command::CacheInfo,
            "refresh" => Command::Refresh,
            "clear-cache" => Command::ClearCache,
            "help" | "-h" | "--help" => Command::Help,
            other => bail!("Unknown command '{}'", other),
        };
        Ok(command)
    }
}

fn option_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(i) => args
            .get(i + 1)
            .filter(|v| !v.starts_with("--"))
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| anyhow!("{} needs a value", flag)),
    }
}

fn parse_year(arg: Option<&String>) -> Result<i32> {
    let raw = arg.ok_or_else(|| anyhow!("missing year"))?;
    raw.parse()
        .with_context(|| format!("'{}' is not a year", raw))
}

fn parse_list(args: &[String]) -> Result<Command> {
    let mut filter = AgencyFilter::default();

    if let Some(query) = option_value(args, "--search")? {
        filter = filter.search(query);
    }
    filter = filter.status(match option_value(args, "--status")? {
        None | Some("all") => StatusFilter::All,
        Some("active") => StatusFilter::Active,
        Some("inactive") => StatusFilter::Inactive,
        Some(other) => bail!("list: unknown status '{}'", other),
    });
    if let Some(department) = option_value(args, "--department")? {
        filter = filter.department(department);
    }
    filter = filter.sort(match option_value(args, "--sort")? {
        None | Some("name") => SortOrder::Name,
        Some("employees") => SortOrder::Employees,
        Some("start") => SortOrder::StartDate,
        Some(other) => bail!("list: unknown sort '{}'", other),
    });

    Ok(Command::List {
        filter,
        json: args.iter().any(|a| a == "--json"),
    })
}

/// Render a data command over the loaded records.
pub fn render(command: &Command, records: &[AgencyRecord], cache: &CacheInfo) -> Result<String> {
    let mut out = String::new();

    match command {
        Command::List { filter, json } => {
            let hits = filter_agencies(records, filter);
            if *json {
                return Ok(serde_json::to_string_pretty(&hits)?);
            }
            for record in &hits {
                out.push_str(&agency_row(record));
                out.push('\n');
            }
            out.push_str(&format!("{} myndigheter", hits.len()));
        }
        Command::Show { name, json } => {
            let record = find_agency(records, name)?;
            if *json {
                return Ok(serde_json::to_string_pretty(record)?);
            }
            out = agency_details(record, records);
        }
        Command::Departments { sort } => {
            for dept in department_stats(records, *sort) {
                out.push_str(&format!(
                    "{:<width$} {:>4} {:>10}\n",
                    truncate_string(&dept.name, DEPARTMENT_WIDTH),
                    dept.count,
                    format_number(dept.employees),
                    width = DEPARTMENT_WIDTH
                ));
            }
        }
        Command::Groups { by } => {
            for group in group_agencies(records, *by) {
                out.push_str(&format!("{} ({})\n", group.key, group.agencies.len()));
                for record in group.agencies {
                    out.push_str(&format!("  {}\n", record.name));
                }
            }
        }
        Command::Regions => {
            for (region, count) in region_stats(records) {
                out.push_str(&format!("{:<10} {:>4}\n", region.display_name(), count));
            }
        }
        Command::Year { year } => {
            let changes = agencies_in_year(records, *year);
            out.push_str(&format!("Bildade {} ({})\n", year, changes.formed.len()));
            for record in &changes.formed {
                out.push_str(&format!("  {}\n", record.name));
            }
            out.push_str(&format!("Nedlagda {} ({})\n", year, changes.dissolved.len()));
            for record in &changes.dissolved {
                out.push_str(&format!("  {}\n", record.name));
            }
        }
        Command::Stats => {
            let stats = dashboard_stats(records);
            out.push_str(&format!("Aktiva myndigheter:   {}\n", stats.active_count));
            out.push_str(&format!(
                "Nedlagda myndigheter: {}\n",
                records.len() - stats.active_count
            ));
            out.push_str(&format!(
                "Anställda totalt:     {}\n",
                format_number(stats.total_employees)
            ));
            out.push_str(&format!(
                "Snitt per myndighet:  {}\n",
                format_number(stats.average_employees)
            ));
            out.push_str(&format!("Andel kvinnor:        {}%\n", stats.percent_women));
            out.push_str(&format!("Data hämtad:          {}", cache.age_display()));
        }
        Command::Series { from, to } => {
            let fte = total_fte_series(records, *from, *to);
            out.push_str("År    Aktiva Bildade Nedlagda        FTE\n");
            for point in agency_count_series(records, *from, *to) {
                let fte = fte
                    .get(&point.year)
                    .map(|v| format_number(v.round() as u64))
                    .unwrap_or_else(|| "-".to_string());
                out.push_str(&format!(
                    "{:<5} {:>6} {:>7} {:>8} {:>10}\n",
                    point.year, point.active, point.formed, point.dissolved, fte
                ));
            }
        }
        Command::CacheInfo | Command::Refresh | Command::ClearCache | Command::Help => {}
    }

    Ok(out.trim_end().to_string())
}

pub fn render_cache_info(info: &CacheInfo) -> String {
    if !info.exists {
        return "No cached data".to_string();
    }
    let mut out = format!("Cached:     {}\n", info.age_display());
    if let Some(age) = info.age_hours {
        out.push_str(&format!("Age:        {:.1} h\n", age));
    }
    if let Some(expires) = info.expires_in_hours {
        if expires > 0.0 {
            out.push_str(&format!("Expires in: {:.1} h", expires));
        } else {
            out.push_str("Expired");
        }
    }
    out.trim_end().to_string()
}

fn agency_row(record: &AgencyRecord) -> String {
    let status = if record.is_active() { ' ' } else { '†' };
    let employees = record
        .employee_count
        .map(|n| format_number(u64::from(n)))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}{:<name$} {:<dept$} {:>8}",
        status,
        truncate_string(&record.name, NAME_WIDTH),
        truncate_string(record.department_or_unknown(), DEPARTMENT_WIDTH),
        employees,
        name = NAME_WIDTH,
        dept = DEPARTMENT_WIDTH
    )
}

/// Exact name, then case-insensitive name or short name.
fn find_agency<'a>(records: &'a [AgencyRecord], query: &str) -> Result<&'a AgencyRecord> {
    if let Some(record) = records.iter().find(|r| r.name == query) {
        return Ok(record);
    }
    let lower = query.to_lowercase();
    if let Some(record) = records.iter().find(|r| {
        r.name.to_lowercase() == lower
            || r.short_name.as_deref().map(str::to_lowercase).as_deref() == Some(lower.as_str())
    }) {
        return Ok(record);
    }

    let suggestions: Vec<&str> = search_suggestions(records, query)
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    if suggestions.is_empty() {
        bail!("No agency named '{}'", query);
    }
    bail!(
        "No agency named '{}'. Did you mean: {}?",
        query,
        suggestions.join(", ")
    )
}

fn agency_details(record: &AgencyRecord, records: &[AgencyRecord]) -> String {
    let mut lines = vec![record.name.clone()];
    let mut field = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            lines.push(format!("  {:<18} {}", label, value));
        }
    };

    field("Kortnamn", record.short_name.clone());
    field("Engelskt namn", record.name_en.clone());
    field("Departement", Some(record.department_or_unknown().to_string()));
    field("Bildad", record.start_date.clone());
    field("Nedlagd", record.end_date.clone());
    field(
        "Anställda",
        record.employee_count.map(|n| format_number(u64::from(n))),
    );
    field(
        "Årsarbetskrafter",
        record
            .full_time_equivalent
            .map(|v| format_number(v.round() as u64)),
    );
    field("Andel kvinnor", record.women_share().map(|p| format!("{:.0}%", p)));
    field("Ort", record.city.clone());
    field("Struktur", record.structure_type.clone());
    field(
        "COFOG",
        record
            .cofog_code
            .as_deref()
            .and_then(cofog_name)
            .map(str::to_string),
    );
    field("Värdmyndighet", record.host_agency.clone());
    field("Org.nr", record.organization_number.clone());
    field("Telefon", record.telephone.clone());
    field("Webb", record.website.clone());
    field(
        "Instruktion",
        (!record.statutes().is_empty()).then(|| record.statutes().join(", ")),
    );
    field(
        "Budget",
        record.budget.map(|b| format!("{} kr", format_number(b.round() as u64))),
    );
    field(
        "Status",
        Some(format_optional(
            (!record.is_active()).then_some("Nedlagd"),
            "Aktiv",
        )),
    );

    let related = related_agencies(record, records);
    if !related.is_empty() {
        lines.push("  Relaterade:".to_string());
        for other in related {
            lines.push(format!("    {}", other.name));
        }
    }

    lines.join("\n")
}
