use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUOTATION_MARKS: Regex = Regex::new(r#"[""”]"#).unwrap();
    static ref BEFORE_STOP_CHARACTERS: Regex =
        Regex::new(r"(?i)^(.*?)(?:,|\s\s|\s-\s| \d| S/N|\s\()").unwrap();
    static ref STREET_TYPE_PREFIX: Regex =
        Regex::new(r"(?i)^(?:Rúa|Avda\.?|Avenida|Camiño|Estrada)(?:\s+d[aeo]s?)?\s*").unwrap();
}

/// Streets displayed with their full type prefix, never shortened.
const EXCEPTION_STREETS: [&str; 13] = [
    "Avda. do Aeroporto",
    "Avda. de Samil",
    "Avda. de Castrelos",
    "Estrada da Garrida",
    "Estrada de Valadares",
    "Estrada do Monte Alba",
    "Estrada da Gándara",
    "Estrada do Vao",
    "Avda. do Tranvía",
    "Avda. da Atlántida",
    "Avda. da Ponte",
    "Rúa da Cruz",
    "Estrada das Prantas",
];

/// Reduces a stop name like `Rúa de Urzáiz, 21 (Centro)` to the bare
/// street it sits on, here `Urzáiz`.
///
/// Everything past the first separator (comma, double space, dash,
/// house number, `S/N`, parenthesis) is cut, then the street-type
/// prefix is dropped unless the street is one of the known exceptions
/// that keep it.
pub fn street_name(original_name: &str) -> String {
    let name = QUOTATION_MARKS.replace_all(original_name, "");
    let name = name.trim();
    let name = match BEFORE_STOP_CHARACTERS.captures(name) {
        Some(captures) => captures.get(1).map_or("", |m| m.as_str()),
        None => name,
    };

    if EXCEPTION_STREETS.contains(&name) {
        return name.to_owned();
    }

    STREET_TYPE_PREFIX.replace(name, "").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuts_at_house_number() {
        assert_eq!("Urzáiz", street_name("Rúa de Urzáiz 21"));
        assert_eq!("Urzáiz", street_name("Rúa de Urzáiz, 21"));
    }

    #[test]
    fn cuts_at_parenthesis_and_dash() {
        assert_eq!("Gran Vía", street_name("Gran Vía (Praza América)"));
        assert_eq!("Gran Vía", street_name("Gran Vía - fronte ao 12"));
    }

    #[test]
    fn drops_street_type_prefix() {
        assert_eq!("Urzáiz", street_name("Rúa de Urzáiz"));
        assert_eq!("Florida", street_name("Avda. da Florida"));
        assert_eq!("Madrid", street_name("Avenida de Madrid"));
    }

    #[test]
    fn exception_streets_keep_their_prefix() {
        assert_eq!("Avda. de Samil", street_name("Avda. de Samil 5"));
        assert_eq!("Estrada do Vao", street_name("Estrada do Vao, 3"));
    }

    #[test]
    fn strips_quotation_marks() {
        assert_eq!("Urzáiz", street_name("Rúa de \"Urzáiz\""));
    }

    #[test]
    fn plain_name_passes_through() {
        assert_eq!("Porta do Sol", street_name("Porta do Sol"));
        assert_eq!("", street_name(""));
    }

    #[test]
    fn sin_numero_marker_is_cut() {
        assert_eq!("Urzáiz", street_name("Rúa de Urzáiz S/N"));
    }
}
