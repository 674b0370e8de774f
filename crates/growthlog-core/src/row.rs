use crate::error::GrowthError;
use crate::pain_point::PainPoint;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const PAIN_POINTS_PER_ROW: usize = 3;
pub const COLUMN_COUNT: usize = 14;

pub const HEADER: [&str; COLUMN_COUNT] = [
    "Date",
    "Query",
    "Leads",
    "Replies",
    "Revenue",
    "Pain_Point_1_Label",
    "Pain_Point_1_Explanation",
    "Pain_Point_1_Link",
    "Pain_Point_2_Label",
    "Pain_Point_2_Explanation",
    "Pain_Point_2_Link",
    "Pain_Point_3_Label",
    "Pain_Point_3_Explanation",
    "Pain_Point_3_Link",
];

// ---------------------------------------------------------------------------
// DateFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `M/D/YYYY`, no leading zeros (`5/29/2025`).
    #[default]
    Short,
    /// `MM/DD/YYYY` (`05/29/2025`).
    Padded,
}

impl DateFormat {
    pub fn render(self, date: NaiveDate) -> String {
        match self {
            DateFormat::Short => format!("{}/{}/{}", date.month(), date.day(), date.year()),
            DateFormat::Padded => date.format("%m/%d/%Y").to_string(),
        }
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateFormat::Short => write!(f, "short"),
            DateFormat::Padded => write!(f, "padded"),
        }
    }
}

impl std::str::FromStr for DateFormat {
    type Err = GrowthError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(DateFormat::Short),
            "padded" => Ok(DateFormat::Padded),
            _ => Err(GrowthError::InvalidDateFormat(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single serialized field. Numbers stay numbers for the spreadsheet API;
/// `Display` gives the CSV text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(u64),
    Float(f64),
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(n) => write!(f, "{n}"),
            // Whole amounts keep one decimal: 0.0, 12.0
            Cell::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.1}"),
            Cell::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// MetricsRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRow {
    pub date: NaiveDate,
    pub query: String,
    pub leads: u64,
    pub replies: u64,
    pub revenue: f64,
    pub pain_points: [PainPoint; PAIN_POINTS_PER_ROW],
}

impl MetricsRow {
    /// The 14 ordered fields: five scalars, then label/explanation/link for
    /// each of the three pain points.
    pub fn to_fields(&self, format: DateFormat) -> Vec<Cell> {
        let mut fields = Vec::with_capacity(COLUMN_COUNT);
        fields.push(Cell::Text(format.render(self.date)));
        fields.push(Cell::Text(self.query.clone()));
        fields.push(Cell::Int(self.leads));
        fields.push(Cell::Int(self.replies));
        fields.push(Cell::Float(self.revenue));
        for point in &self.pain_points {
            fields.push(Cell::Text(point.label.clone()));
            fields.push(Cell::Text(point.explanation.clone()));
            fields.push(Cell::Text(point.link.clone()));
        }
        while fields.len() < COLUMN_COUNT {
            fields.push(Cell::Text(String::new()));
        }
        fields
    }

    pub fn to_strings(&self, format: DateFormat) -> Vec<String> {
        self.to_fields(format).iter().map(Cell::to_string).collect()
    }
}

// ---------------------------------------------------------------------------
// MetricsRowBuilder
// ---------------------------------------------------------------------------

/// Assembles a fully padded `MetricsRow`. Never fails: surplus pain points
/// are dropped, missing ones become empty placeholders.
#[derive(Debug, Clone, Default)]
pub struct MetricsRowBuilder {
    query: String,
    leads: u64,
    replies: u64,
    revenue: f64,
    pain_points: Vec<PainPoint>,
}

impl MetricsRowBuilder {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn leads(mut self, leads: u64) -> Self {
        self.leads = leads;
        self
    }

    pub fn replies(mut self, replies: u64) -> Self {
        self.replies = replies;
        self
    }

    pub fn revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn pain_points(mut self, points: impl IntoIterator<Item = PainPoint>) -> Self {
        self.pain_points.extend(points);
        self
    }

    pub fn build(self, date: NaiveDate) -> MetricsRow {
        let revenue = if self.revenue.is_finite() && self.revenue >= 0.0 {
            self.revenue
        } else {
            tracing::warn!(revenue = self.revenue, "revenue out of range, recording 0.0");
            0.0
        };

        if self.pain_points.len() > PAIN_POINTS_PER_ROW {
            tracing::debug!(
                supplied = self.pain_points.len(),
                "dropping pain points beyond the first {PAIN_POINTS_PER_ROW}"
            );
        }
        let mut supplied = self.pain_points.into_iter();
        let pain_points = std::array::from_fn(|_| supplied.next().unwrap_or_default());

        MetricsRow {
            date,
            query: self.query,
            leads: self.leads,
            replies: self.replies,
            revenue,
            pain_points,
        }
    }

    /// Build with the local calendar date at call time.
    pub fn build_today(self) -> MetricsRow {
        self.build(Local::now().date_naive())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
