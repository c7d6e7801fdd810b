//! Column layout of the Kaufpreissammlung dataset.

/// Cadastral district code.
pub const KG_CODE: &str = "KG.Code";
/// Acquisition date, `ddmmyyyy` in the source.
pub const ACQUISITION_DATE: &str = "Erwerbsdatum";
/// Construction year.
pub const CONSTRUCTION_YEAR: &str = "BJ";
/// Annual ground rent, `EUR 1.234,56` in the source.
pub const GROUND_RENT: &str = "Bauzins";

/// Column names of the source file, in file order. The source header is
/// replaced by these names on download.
pub const SOURCE_COLUMNS: [&str; 47] = [
    "KG.Code",
    "Katastralgemeinde",
    "EZ",
    "PLZ",
    "Strasse",
    "ON",
    "Gst.",
    "Gst.Fl.",
    "ErwArt",
    "Erwerbsdatum",
    "Widmung",
    "Bauklasse",
    "Gebäudehöhe",
    "Bauweise",
    "Zusatz",
    "Schutzzone",
    "Wohnzone",
    "öZ",
    "Bausperre",
    "seit/bis",
    "zuordnung",
    "Geschoße",
    "parz.",
    "VeräußererCode",
    "Erwerbercode",
    "Zähler",
    "Nenner",
    "BJ",
    "TZ",
    "Kaufpreis EUR",
    "EUR/m2 Gfl.",
    "AbbruchfixEU",
    "m3 Abbruch",
    "AbbruchkostEU",
    "FreimachfixEU",
    "Freimachfläche",
    "FreimachkostEU",
    "Baureifgest",
    "% Widmung",
    "Baurecht",
    "Bis",
    "auf EZ",
    "Stammeinlage",
    "sonst_wid",
    "sonst_wid_prz",
    "ber. Kaufpreis",
    "Bauzins",
];

/// Column set shown by the `predefined` selector.
pub const PREDEFINED_COLUMNS: [&str; 11] = [
    "Erwerbsdatum",
    "zuordnung",
    "BJ",
    "Gebäudehöhe",
    "KG.Code",
    "Strasse",
    "ON",
    "Gst.Fl.",
    "AbbruchkostEU",
    "ber. Kaufpreis",
    "Bauzins",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_columns_are_part_of_the_source_layout() {
        for name in [KG_CODE, ACQUISITION_DATE, CONSTRUCTION_YEAR, GROUND_RENT] {
            assert!(SOURCE_COLUMNS.contains(&name), "{name} missing");
        }
        for name in PREDEFINED_COLUMNS {
            assert!(SOURCE_COLUMNS.contains(&name), "{name} missing");
        }
    }
}
