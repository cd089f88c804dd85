use std::fmt;
use std::str::FromStr;

use crate::error::RecipeError;
use crate::schema::features;

/// Holiday jurisdictions: the country as a whole plus the 13 provinces and
/// territories. Declaration order is the output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Jurisdiction {
    Country,
    Alberta,
    BritishColumbia,
    Manitoba,
    NewBrunswick,
    NewfoundlandAndLabrador,
    NovaScotia,
    NorthwestTerritories,
    Nunavut,
    Ontario,
    PrinceEdwardIsland,
    Quebec,
    Saskatchewan,
    Yukon,
}

impl Jurisdiction {
    pub const COUNT: usize = 14;

    pub const ALL: [Jurisdiction; Self::COUNT] = [
        Jurisdiction::Country,
        Jurisdiction::Alberta,
        Jurisdiction::BritishColumbia,
        Jurisdiction::Manitoba,
        Jurisdiction::NewBrunswick,
        Jurisdiction::NewfoundlandAndLabrador,
        Jurisdiction::NovaScotia,
        Jurisdiction::NorthwestTerritories,
        Jurisdiction::Nunavut,
        Jurisdiction::Ontario,
        Jurisdiction::PrinceEdwardIsland,
        Jurisdiction::Quebec,
        Jurisdiction::Saskatchewan,
        Jurisdiction::Yukon,
    ];

    /// Position in [`Jurisdiction::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short code used in feature names. Yukon keeps the legacy `YU`.
    pub fn code(self) -> &'static str {
        match self {
            Jurisdiction::Country => "country",
            Jurisdiction::Alberta => "AB",
            Jurisdiction::BritishColumbia => "BC",
            Jurisdiction::Manitoba => "MB",
            Jurisdiction::NewBrunswick => "NB",
            Jurisdiction::NewfoundlandAndLabrador => "NL",
            Jurisdiction::NovaScotia => "NS",
            Jurisdiction::NorthwestTerritories => "NT",
            Jurisdiction::Nunavut => "NU",
            Jurisdiction::Ontario => "ON",
            Jurisdiction::PrinceEdwardIsland => "PE",
            Jurisdiction::Quebec => "QC",
            Jurisdiction::Saskatchewan => "SK",
            Jurisdiction::Yukon => "YU",
        }
    }

    pub fn feature_name(self) -> &'static str {
        features::ALL[self.index()]
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Jurisdiction {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.eq_ignore_ascii_case("country") || code.eq_ignore_ascii_case("CA") {
            return Ok(Jurisdiction::Country);
        }
        if code.eq_ignore_ascii_case("YT") {
            return Ok(Jurisdiction::Yukon);
        }
        Jurisdiction::ALL
            .into_iter()
            .find(|j| j.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| RecipeError::InvalidData(format!("Unknown jurisdiction code: '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_follow_declaration_order() {
        for (i, j) in Jurisdiction::ALL.iter().enumerate() {
            assert_eq!(j.index(), i);
            assert_eq!(j.feature_name(), format!("is_CA_holiday_{}", j.code()));
        }
    }

    #[test]
    fn parses_codes_and_aliases() {
        assert_eq!("qc".parse::<Jurisdiction>().unwrap(), Jurisdiction::Quebec);
        assert_eq!("YT".parse::<Jurisdiction>().unwrap(), Jurisdiction::Yukon);
        assert_eq!("country".parse::<Jurisdiction>().unwrap(), Jurisdiction::Country);
        assert!("XX".parse::<Jurisdiction>().is_err());
    }
}
