//! Per-bank flat record layout (§4.D, §6).
//!
//! CNAB-400 has one record shape, not one shape per segment letter, so the
//! registry here is simpler than CNAB-240's: a single `RecordLayout` per
//! bank code, the same `bank_code -> layout` + `BANK_UNKNOWN` fallback
//! pattern as `cnab_parser_240::layout::BankLayoutRegistry`.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    pub codigo_banco: (usize, usize),
    pub agencia: (usize, usize),
    pub conta: (usize, usize),
    pub codigo_ocorrencia: (usize, usize),
    pub nosso_numero: (usize, usize),
    pub seu_numero: (usize, usize),
    pub codigo_barras: (usize, usize),
    pub data_vencimento: (usize, usize),
    pub valor_titulo: (usize, usize),
    pub data_pagamento: (usize, usize),
    pub valor_pago: (usize, usize),
    pub pagador_documento: (usize, usize),
    pub pagador_nome: (usize, usize),
    pub linha_digitavel: (usize, usize),
}

/// Base FEBRABAN CNAB-400 detail layout. Itaú (bank `341`) is the dialect's
/// reference layout and happens to match the base table exactly, so it is
/// only listed in `known_base_banks`, not as an override — there is nothing
/// to override.
pub const BASE_RECORD_LAYOUT: RecordLayout = RecordLayout {
    codigo_banco: (0, 3),
    agencia: (3, 7),
    conta: (7, 13),
    codigo_ocorrencia: (13, 15),
    nosso_numero: (15, 30),
    seu_numero: (30, 40),
    codigo_barras: (40, 84),
    data_vencimento: (84, 90),
    valor_titulo: (90, 103),
    data_pagamento: (103, 109),
    valor_pago: (109, 122),
    pagador_documento: (122, 136),
    pagador_nome: (136, 176),
    linha_digitavel: (176, 224),
};

pub struct BankLayoutRegistry400 {
    overrides: HashMap<String, RecordLayout>,
    known_base_banks: Vec<String>,
}

impl BankLayoutRegistry400 {
    pub fn with_default_banks() -> Self {
        Self {
            overrides: HashMap::new(),
            known_base_banks: vec!["341".to_string(), "001".to_string(), "237".to_string()],
        }
    }

    pub fn empty() -> Self {
        Self {
            overrides: HashMap::new(),
            known_base_banks: Vec::new(),
        }
    }

    /// Returns the layout to decode with plus whether `bank_code` was
    /// unrecognized (caller turns that into a `BANK_UNKNOWN` warning).
    pub fn resolve(&self, bank_code: &str) -> (RecordLayout, bool) {
        if let Some(layout) = self.overrides.get(bank_code) {
            return (*layout, false);
        }
        (BASE_RECORD_LAYOUT, !self.is_known(bank_code))
    }

    fn is_known(&self, bank_code: &str) -> bool {
        self.known_base_banks.iter().any(|b| b == bank_code) || self.overrides.contains_key(bank_code)
    }
}

impl Default for BankLayoutRegistry400 {
    fn default() -> Self {
        Self::with_default_banks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itau_is_known_with_the_base_layout() {
        let registry = BankLayoutRegistry400::with_default_banks();
        let (layout, unknown) = registry.resolve("341");
        assert!(!unknown);
        assert_eq!(layout.codigo_barras, BASE_RECORD_LAYOUT.codigo_barras);
    }

    #[test]
    fn unregistered_bank_warns_but_still_decodes() {
        let registry = BankLayoutRegistry400::with_default_banks();
        let (_, unknown) = registry.resolve("999");
        assert!(unknown);
    }
}
