//! Per-`(bank_code, segment_letter)` field position table (§4.C, §6).
//!
//! The state machine always has *some* table to decode a segment with: an
//! unrecognized bank falls back to [`base_layout`] and the caller records a
//! `BANK_UNKNOWN` warning. Itaú (`341`) ships as the one concrete override —
//! the worked example the registry is built to make adding more of trivial
//! (see SPEC_FULL.md §12).

use std::collections::HashMap;

/// Byte ranges (0-based, end-exclusive, relative to the whole 240-byte
/// line) for the fields a payable segment (J or O) carries.
#[derive(Debug, Clone, Copy)]
pub struct SegmentLayout {
    pub codigo_barras: (usize, usize),
    pub nome: (usize, usize),
    pub data_vencimento: (usize, usize),
    pub valor_principal: (usize, usize),
    pub valor_pago: (usize, usize),
    pub data_pagamento: (usize, usize),
    pub nosso_numero: (usize, usize),
}

/// Base FEBRABAN-conformant layout for segment J (título, 44-digit barcode).
pub const BASE_SEGMENT_J: SegmentLayout = SegmentLayout {
    codigo_barras: (17, 61),
    nome: (61, 91),
    data_vencimento: (91, 99),
    valor_principal: (99, 114),
    valor_pago: (114, 129),
    data_pagamento: (129, 137),
    nosso_numero: (137, 152),
};

/// Base layout for segment O (tributo/concessionária, 48-digit barcode).
pub const BASE_SEGMENT_O: SegmentLayout = SegmentLayout {
    codigo_barras: (17, 65),
    nome: (65, 95),
    data_vencimento: (95, 103),
    valor_principal: (103, 118),
    valor_pago: (118, 133),
    data_pagamento: (133, 141),
    nosso_numero: (17, 17), // segment O has no nosso_numero field; zero-width
};

#[derive(Debug, Clone, Copy)]
pub struct FixedSegmentLayout {
    pub field_a: (usize, usize),
    pub field_b: (usize, usize),
    pub field_c: (usize, usize),
    pub field_d: (usize, usize),
}

/// Segment A (crédito): numero_documento, favorecido_nome, valor_pagamento, data_pagamento.
pub const BASE_SEGMENT_A: FixedSegmentLayout = FixedSegmentLayout {
    field_a: (17, 37),
    field_b: (37, 67),
    field_c: (67, 82),
    field_d: (82, 90),
};

/// Segment B (endereço/PIX): endereco, bairro, cidade, cep, uf, chave_pix.
#[derive(Debug, Clone, Copy)]
pub struct SegmentBLayout {
    pub endereco: (usize, usize),
    pub bairro: (usize, usize),
    pub cidade: (usize, usize),
    pub cep: (usize, usize),
    pub uf: (usize, usize),
    pub chave_pix: (usize, usize),
}

pub const BASE_SEGMENT_B: SegmentBLayout = SegmentBLayout {
    endereco: (17, 47),
    bairro: (47, 62),
    cidade: (62, 82),
    cep: (82, 90),
    uf: (90, 92),
    chave_pix: (92, 150),
};

pub struct BankLayoutRegistry {
    segment_j_overrides: HashMap<String, SegmentLayout>,
    segment_o_overrides: HashMap<String, SegmentLayout>,
    /// Bank codes known to correctly use the base layout as-is — these do
    /// not raise `BANK_UNKNOWN` even though no override is registered.
    known_base_banks: Vec<String>,
}

impl BankLayoutRegistry {
    /// Registers the worked example (Itaú, `341`) plus a couple of large
    /// banks that are known to follow the base FEBRABAN table verbatim.
    pub fn with_default_banks() -> Self {
        let mut segment_j_overrides = HashMap::new();
        // Itaú shifts `nosso_numero` eight bytes earlier and trims the name
        // field by the same amount to make room for an internal control code.
        segment_j_overrides.insert(
            "341".to_string(),
            SegmentLayout {
                codigo_barras: (17, 61),
                nome: (61, 83),
                data_vencimento: (91, 99),
                valor_principal: (99, 114),
                valor_pago: (114, 129),
                data_pagamento: (129, 137),
                nosso_numero: (83, 98),
            },
        );

        Self {
            segment_j_overrides,
            segment_o_overrides: HashMap::new(),
            known_base_banks: vec!["001".to_string(), "237".to_string(), "104".to_string()],
        }
    }

    pub fn empty() -> Self {
        Self {
            segment_j_overrides: HashMap::new(),
            segment_o_overrides: HashMap::new(),
            known_base_banks: Vec::new(),
        }
    }

    /// Returns the layout to use for segment J plus whether the bank code
    /// was unrecognized (caller turns that into a `BANK_UNKNOWN` warning).
    pub fn resolve_segment_j(&self, bank_code: &str) -> (SegmentLayout, bool) {
        if let Some(layout) = self.segment_j_overrides.get(bank_code) {
            return (*layout, false);
        }
        (BASE_SEGMENT_J, !self.is_known(bank_code))
    }

    pub fn resolve_segment_o(&self, bank_code: &str) -> (SegmentLayout, bool) {
        if let Some(layout) = self.segment_o_overrides.get(bank_code) {
            return (*layout, false);
        }
        (BASE_SEGMENT_O, !self.is_known(bank_code))
    }

    fn is_known(&self, bank_code: &str) -> bool {
        self.known_base_banks.iter().any(|b| b == bank_code) || self.segment_j_overrides.contains_key(bank_code)
    }
}

impl Default for BankLayoutRegistry {
    fn default() -> Self {
        Self::with_default_banks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bank_has_no_warning() {
        let registry = BankLayoutRegistry::with_default_banks();
        let (_, unknown) = registry.resolve_segment_j("001");
        assert!(!unknown);
    }

    #[test]
    fn itau_override_differs_from_base() {
        let registry = BankLayoutRegistry::with_default_banks();
        let (layout, unknown) = registry.resolve_segment_j("341");
        assert!(!unknown);
        assert_ne!(layout.nosso_numero, BASE_SEGMENT_J.nosso_numero);
    }

    #[test]
    fn unregistered_bank_falls_back_to_base_with_warning() {
        let registry = BankLayoutRegistry::with_default_banks();
        let (layout, unknown) = registry.resolve_segment_j("999");
        assert!(unknown);
        assert_eq!(layout.codigo_barras, BASE_SEGMENT_J.codigo_barras);
    }
}
