/// Column names shared by the holiday flags and the lookup joins.
/// `lib.rs` mirrors `features` and `display` into the Python module.

// ── Holiday feature columns ─────────────────────────────────────────────────
pub mod features {
    pub const COUNTRY: &str = "is_CA_holiday_country";
    pub const AB: &str = "is_CA_holiday_AB";
    pub const BC: &str = "is_CA_holiday_BC";
    pub const MB: &str = "is_CA_holiday_MB";
    pub const NB: &str = "is_CA_holiday_NB";
    pub const NL: &str = "is_CA_holiday_NL";
    pub const NS: &str = "is_CA_holiday_NS";
    pub const NT: &str = "is_CA_holiday_NT";
    pub const NU: &str = "is_CA_holiday_NU";
    pub const ON: &str = "is_CA_holiday_ON";
    pub const PE: &str = "is_CA_holiday_PE";
    pub const QC: &str = "is_CA_holiday_QC";
    pub const SK: &str = "is_CA_holiday_SK";
    pub const YU: &str = "is_CA_holiday_YU";

    pub const ALL: [&str; 14] = [
        COUNTRY, AB, BC, MB, NB, NL, NS, NT, NU, ON, PE, QC, SK, YU,
    ];
}

// ── Lookup key columns ──────────────────────────────────────────────────────
pub mod keys {
    pub const YEAR: &str = "year";
    pub const DAY_OF_YEAR: &str = "doy";
    pub const ROW_INDEX: &str = "__row";
    pub const DATE: &str = "__date";
}

// ── Labeled dataset ─────────────────────────────────────────────────────────
pub mod dataset {
    pub const DEFAULT_LABEL: &str = "label";
}

// ── Display names ───────────────────────────────────────────────────────────
pub mod display {
    pub const HOLIDAYS: &str = "CA_Holidays";
    pub const LFR: &str = "LfrDebiasingTransformer";
}
