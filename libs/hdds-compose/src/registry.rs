//! # Registries
//!
//! Monotonic identifier counters for one translation run.
//!
//! Solids and divisions share one namespace, rotations and materials have
//! their own. Every counter starts at zero and hands out `1, 2, 3, ...`.
//! Division names are drawn from per-axis counters so that the first
//! azimuthal division is `sd01`, the first radial one `rd01`, and so on.

use config::constants::DIVISION_NAME_BASE;

use crate::frame::DivisionAxis;

/// Identifier counters of one run.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    solids: u32,
    rotations: u32,
    materials: u32,
    divisions: [u32; DivisionAxis::ALL.len()],
    fields: Vec<String>,
}

impl Registries {
    /// Fresh counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next solid (or division) id.
    pub fn next_solid(&mut self) -> u32 {
        self.solids += 1;
        self.solids
    }

    /// Next rotation id.
    pub fn next_rotation(&mut self) -> u32 {
        self.rotations += 1;
        self.rotations
    }

    /// Next material id.
    pub fn next_material(&mut self) -> u32 {
        self.materials += 1;
        self.materials
    }

    /// Next synthesized division name for an axis, e.g. `sd01`.
    pub fn next_division_name(&mut self, axis: DivisionAxis) -> String {
        let counter = &mut self.divisions[axis.slot()];
        *counter += 1;
        format!("{}{:03x}", axis.name_prefix(), DIVISION_NAME_BASE + *counter)
    }

    /// Record an identifier field name; returns whether it was new.
    pub fn record_field(&mut self, field: &str) -> bool {
        if self.fields.iter().any(|known| known == field) {
            return false;
        }
        self.fields.push(field.to_string());
        true
    }

    /// Distinct identifier field names in order of first appearance.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Counts handed out so far: solids, rotations, materials.
    pub fn counts(&self) -> (u32, u32, u32) {
        (self.solids, self.rotations, self.materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent() {
        let mut registries = Registries::new();
        assert_eq!(registries.next_solid(), 1);
        assert_eq!(registries.next_solid(), 2);
        assert_eq!(registries.next_rotation(), 1);
        assert_eq!(registries.next_material(), 1);
        assert_eq!(registries.counts(), (2, 1, 1));
    }

    #[test]
    fn division_names_count_per_axis() {
        let mut registries = Registries::new();
        assert_eq!(registries.next_division_name(DivisionAxis::Phi), "sd01");
        assert_eq!(registries.next_division_name(DivisionAxis::Phi), "sd02");
        assert_eq!(registries.next_division_name(DivisionAxis::Rho), "rd01");
        assert_eq!(registries.next_division_name(DivisionAxis::Z), "zd01");
        for _ in 0..13 {
            registries.next_division_name(DivisionAxis::X);
        }
        assert_eq!(registries.next_division_name(DivisionAxis::X), "xd0e");
    }

    #[test]
    fn fields_are_recorded_once() {
        let mut registries = Registries::new();
        assert!(registries.record_field("layer"));
        assert!(registries.record_field("sector"));
        assert!(!registries.record_field("layer"));
        assert_eq!(registries.fields(), ["layer", "sector"]);
    }
}
