//! Document and phone number formatters (CPF, CNPJ, Brazilian phones).
//!
//! Every formatter strips non-digits first. When the digit count does not
//! match the document, the input is returned unchanged.

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Applies `mask` to the digits of `raw`, each `#` taking the next digit.
fn apply_mask(raw: &str, len: usize, mask: &str) -> String {
    let digits = digits(raw);
    if digits.len() != len {
        return raw.to_string();
    }
    let mut digits = digits.chars();
    mask.chars()
        .map(|c| match c {
            '#' => digits.next().unwrap_or_default(),
            other => other,
        })
        .collect()
}

/// `12345678901` → `123.456.789-01`
pub fn format_cpf(raw: &str) -> String {
    apply_mask(raw, 11, "###.###.###-##")
}

/// `12345678000195` → `12.345.678/0001-95`
pub fn format_cnpj(raw: &str) -> String {
    apply_mask(raw, 14, "##.###.###/####-##")
}

/// `45999083444` → `(45) 99908-3444`
pub fn format_cell_phone(raw: &str) -> String {
    apply_mask(raw, 11, "(##) #####-####")
}

/// `4530251234` → `(45) 3025-1234`
pub fn format_phone(raw: &str) -> String {
    apply_mask(raw, 10, "(##) ####-####")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("12345678901"), "123.456.789-01");
        assert_eq!(format_cpf("123.456.789-01"), "123.456.789-01");
        assert_eq!(format_cpf("1234"), "1234");
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("12345678000195"), "12.345.678/0001-95");
        assert_eq!(format_cnpj("12.345.678/0001-95"), "12.345.678/0001-95");
    }

    #[test]
    fn test_format_phones() {
        assert_eq!(format_cell_phone("45999083444"), "(45) 99908-3444");
        assert_eq!(format_cell_phone("(45) 99908-3444"), "(45) 99908-3444");
        assert_eq!(format_phone("4530251234"), "(45) 3025-1234");
        assert_eq!(format_phone("45999083444"), "45999083444");
    }
}
