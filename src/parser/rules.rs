// Field extraction rules. Each rule is independent and tried in list order;
// the first rule that produces a value for a field wins.
use crate::model::{FieldKey, FieldValue, ParserError};
use regex::{Captures, Regex};

/// Value produced by a rule plus the exact matched text (in the cleaned input).
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub value: FieldValue,
    pub matched: String,
}

/// Attempts to extract one field from cleaned listing text.
pub trait FieldRule: Send + Sync {
    /// Short identifier for logs and tests, e.g. `price.labeled`.
    fn name(&self) -> &'static str;
    fn field(&self) -> FieldKey;
    fn apply(&self, cleaned: &str) -> Option<RuleMatch>;
}

type Convert = fn(&Captures) -> Option<FieldValue>;

/// Rule backed by a regex: only the first match is considered, and the
/// converter may reject it (value guards).
pub struct PatternRule {
    name: &'static str,
    field: FieldKey,
    regex: Regex,
    convert: Convert,
}

impl PatternRule {
    pub fn new(
        name: &'static str,
        field: FieldKey,
        pattern: &str,
        convert: Convert,
    ) -> Result<Self, ParserError> {
        let regex = Regex::new(pattern).map_err(|source| ParserError::Pattern { rule: name, source })?;
        Ok(Self { name, field, regex, convert })
    }
}

impl FieldRule for PatternRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn field(&self) -> FieldKey {
        self.field.clone()
    }

    fn apply(&self, cleaned: &str) -> Option<RuleMatch> {
        let caps = self.regex.captures(cleaned)?;
        let value = (self.convert)(&caps)?;
        Some(RuleMatch {
            value,
            matched: caps[0].to_string(),
        })
    }
}

// Czech upper/lower case letters used by the address patterns.
const UPPER: &str = "A-ZÁČĎÉĚÍŇÓŘŠŤÚŮÝŽ";
const LOWER: &str = "a-záčďéěíňóřšťúůýž";

/// Prague districts recognised as LOCATION.
pub const PRAGUE_DISTRICTS: [&str; 16] = [
    "Vinohrady",
    "Žižkov",
    "Smíchov",
    "Karlín",
    "Holešovice",
    "Holešovičky",
    "Dejvice",
    "Letná",
    "Libeň",
    "Rokoska",
    "Kobylisy",
    "Bubeneč",
    "Vršovice",
    "Nusle",
    "Břevnov",
    "Strašnice",
];

/// Listing prices below this are floor numbers, years, fees... never a sale price.
pub const MIN_PRICE: i64 = 100_000;
/// Exclusive bounds for a plausible flat area in m².
pub const SIZE_BOUNDS: (f64, f64) = (10.0, 500.0);

fn capture_text<'h>(caps: &Captures<'h>, i: usize) -> Option<&'h str> {
    caps.get(i).map(|m| m.as_str())
}

fn decimal(caps: &Captures, i: usize) -> Option<f64> {
    capture_text(caps, i)?.replace(',', ".").parse().ok()
}

fn price(caps: &Captures) -> Option<FieldValue> {
    let digits: String = capture_text(caps, 1)?
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let n: i64 = digits.parse().ok()?;
    (n > MIN_PRICE).then_some(FieldValue::Integer(n))
}

fn size(caps: &Captures) -> Option<FieldValue> {
    let n = decimal(caps, 1)?;
    (n > SIZE_BOUNDS.0 && n < SIZE_BOUNDS.1).then(|| FieldValue::number(n))
}

fn area(caps: &Captures) -> Option<FieldValue> {
    decimal(caps, 1).map(FieldValue::number)
}

fn first_capture(caps: &Captures) -> Option<FieldValue> {
    capture_text(caps, 1).map(FieldValue::text)
}

/// The default Czech listing rule set, in priority order.
pub fn default_rules() -> Result<Vec<Box<dyn FieldRule>>, ParserError> {
    let districts = PRAGUE_DISTRICTS.join("|");
    let word = format!("[{UPPER}][{LOWER}]+");
    let words = format!("{word}(?:\\s+[{LOWER}]+)?");

    let rules: Vec<PatternRule> = vec![
        // PRICE
        PatternRule::new(
            "price.labeled",
            FieldKey::Price,
            r"(?i)cena[:\s]*([0-9]{1,3}(?:[\s.][0-9]{3})+)\s*(?:kč|czk|,-)",
            price,
        )?,
        PatternRule::new(
            "price.bare",
            FieldKey::Price,
            r"(?i)([0-9]{1,3}(?:[\s.][0-9]{3})+)\s*(?:kč|czk|,-)",
            price,
        )?,
        // SIZE
        PatternRule::new(
            "size.labeled",
            FieldKey::Size,
            r"(?i)(?:užitná\s+)?(?:plocha|podlahová)[:\s]*([0-9]+(?:[.,][0-9]+)?)\s*m",
            size,
        )?,
        PatternRule::new(
            "size.bare",
            FieldKey::Size,
            r"(?i)([0-9]+(?:[.,][0-9]+)?)\s*m²",
            size,
        )?,
        // ROOMS
        PatternRule::new(
            "rooms.layout",
            FieldKey::Rooms,
            r"(?i)([0-9]\s*\+\s*(?:kk|1|2))",
            |caps| {
                let layout: String = capture_text(caps, 1)?
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                Some(FieldValue::Text(layout))
            },
        )?,
        PatternRule::new(
            "rooms.bedrooms",
            FieldKey::Rooms,
            r"(?i)([0-9]+)\s*(?:ložnic|bedroom)",
            |caps| {
                let bedrooms: u32 = capture_text(caps, 1)?.parse().ok()?;
                Some(FieldValue::Text(format!("{}+kk", bedrooms.checked_add(1)?)))
            },
        )?,
        // FLOOR
        PatternRule::new(
            "floor.ordinal",
            FieldKey::Floor,
            r"(?i)([0-9]+)\.\s*(?:patro|podlaží|np)(?:\s*(?:z|ze|/)\s*([0-9]+))?",
            floor,
        )?,
        PatternRule::new(
            "floor.fraction",
            FieldKey::Floor,
            r"(?i)([0-9]+)\s*/\s*([0-9]+)\s*(?:patro|np|podlaží)?",
            floor,
        )?,
        // BALCONY / CELLAR
        PatternRule::new(
            "balcony.area",
            FieldKey::Balcony,
            r"(?i)(?:balkon|balkón|lodžie|terasa)[:\s]*([0-9]+(?:[.,][0-9]+)?)\s*m",
            area,
        )?,
        PatternRule::new(
            "cellar.area",
            FieldKey::Cellar,
            r"(?i)sklep[:\s]*([0-9]+(?:[.,][0-9]+)?)\s*m",
            area,
        )?,
        PatternRule::new("cellar.present", FieldKey::Cellar, r"(?i)sklep[:\s]*ano", |_| {
            Some(FieldValue::Integer(1))
        })?,
        // PARKING
        PatternRule::new("parking.garage", FieldKey::Parking, r"(?i)garáž|garage", |_| {
            Some(FieldValue::text("Garage"))
        })?,
        PatternRule::new(
            "parking.dedicated",
            FieldKey::Parking,
            r"(?i)parkovací\s*(?:stání|místo)",
            |_| Some(FieldValue::text("Dedicated")),
        )?,
        // BUILDING
        PatternRule::new(
            "building.brick",
            FieldKey::Building,
            r"(?i)cihlový|cihlová|cihla|brick",
            |_| Some(FieldValue::text("Brick")),
        )?,
        PatternRule::new("building.panel", FieldKey::Building, r"(?i)panel", |_| {
            Some(FieldValue::text("Panel"))
        })?,
        // LOCATION
        PatternRule::new(
            "location.prague",
            FieldKey::Location,
            &format!(r"(?i)({districts}|Praha\s*[0-9]+)"),
            first_capture,
        )?,
        // ADDRESS
        PatternRule::new(
            "address.street",
            FieldKey::Address,
            &format!(r"(?i)\b(?:ulice|ul\.?)[:\s]*({word})"),
            first_capture,
        )?,
        PatternRule::new(
            "address.sale-title",
            FieldKey::Address,
            &format!(r"(?i)prodej\s+bytu[^,]*,\s*({words})"),
            first_capture,
        )?,
        PatternRule::new(
            "address.street-number",
            FieldKey::Address,
            &format!(r"({words})\s+[0-9]{{1,4}}(?:/[0-9]+)?\s*,"),
            first_capture,
        )?,
        // ENERGY
        PatternRule::new(
            "energy.class",
            FieldKey::Energy,
            r"(?i)(?:PENB|energetick\w*(?:\s+náročnost\w*)?(?:\s+budovy)?)[:\s]*([A-G])\b",
            |caps| capture_text(caps, 1).map(|c| FieldValue::Text(c.to_uppercase())),
        )?,
        PatternRule::new(
            "energy.extremely-inefficient",
            FieldKey::Energy,
            r"(?i)mimořádně\s*nehospodárná",
            |_| Some(FieldValue::text("G")),
        )?,
    ];

    Ok(rules
        .into_iter()
        .map(|r| Box::new(r) as Box<dyn FieldRule>)
        .collect())
}

fn floor(caps: &Captures) -> Option<FieldValue> {
    let level = capture_text(caps, 1)?;
    let value = match capture_text(caps, 2) {
        Some(total) => format!("{}/{}", level, total),
        None => level.to_string(),
    };
    Some(FieldValue::Text(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> Box<dyn FieldRule> {
        default_rules()
            .unwrap()
            .into_iter()
            .find(|r| r.name() == name)
            .unwrap()
    }

    #[test]
    fn every_rule_compiles_with_unique_name() {
        let rules = default_rules().unwrap();
        let mut names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn price_guard_rejects_small_numbers() {
        let r = rule("price.bare");
        assert!(r.apply("poplatek 2 500 Kč měsíčně").is_none());
        let m = r.apply("jen 9.450.000,- k jednání").unwrap();
        assert_eq!(m.value, FieldValue::Integer(9_450_000));
        assert_eq!(m.matched, "9.450.000,-");
    }

    #[test]
    fn size_guard_rejects_out_of_range() {
        let r = rule("size.bare");
        assert!(r.apply("sklep 4 m²").is_none());
        assert_eq!(r.apply("byt 61,5 m²").unwrap().value, FieldValue::Decimal(61.5));
    }

    #[test]
    fn rooms_layout_ignores_spaces() {
        let m = rule("rooms.layout").apply("dispozice 3 + KK").unwrap();
        assert_eq!(m.value, FieldValue::text("3+KK"));
    }

    #[test]
    fn bedrooms_convert_to_layout() {
        let m = rule("rooms.bedrooms").apply("2 bedrooms and a study").unwrap();
        assert_eq!(m.value, FieldValue::text("3+kk"));
        assert!(rule("rooms.bedrooms").apply("4294967295 bedrooms").is_none());
    }

    #[test]
    fn floor_with_and_without_total() {
        let ordinal = rule("floor.ordinal");
        assert_eq!(ordinal.apply("3. patro ze 5").unwrap().value, FieldValue::text("3/5"));
        assert_eq!(ordinal.apply("2. NP").unwrap().value, FieldValue::text("2"));
        let fraction = rule("floor.fraction");
        assert_eq!(fraction.apply("podlaží 4/7").unwrap().value, FieldValue::text("4/7"));
    }

    #[test]
    fn energy_letter_is_uppercased() {
        let m = rule("energy.class").apply("PENB: c").unwrap();
        assert_eq!(m.value, FieldValue::text("C"));
        let m = rule("energy.class")
            .apply("Energetická náročnost budovy: D")
            .unwrap();
        assert_eq!(m.value, FieldValue::text("D"));
    }

    #[test]
    fn street_number_pattern_is_case_sensitive() {
        let r = rule("address.street-number");
        let m = r.apply("Adresa: Bubenské nábřeží 866/11, Praha 7").unwrap();
        assert_eq!(m.value, FieldValue::text("Bubenské nábřeží"));
        assert!(r.apply("cena 866, dohodou").is_none());
    }
}
