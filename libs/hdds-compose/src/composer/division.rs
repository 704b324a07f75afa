//! Division of a container into equal slices.
//!
//! A division replaces `ncopy` explicit placements by a single placement of
//! the target into a synthetic `division` element. The division is appended
//! to the document under the container it slices, so that later lookups and
//! placements can treat it like any other mother volume.

use glam::DVec3;
use tracing::debug;

use super::placement::{identifier_values, Command, Scope};
use super::Composer;
use crate::error::{TranslateError, TranslateResult};
use crate::event::Event;
use crate::frame::{Partition, ReferenceFrame};

impl Composer<'_> {
    /// Slice the current mother along `partition.axis` and place the command's
    /// target once inside the division.
    ///
    /// ## Parameters
    ///
    /// - `frame`: Frame carrying the command's identifiers and mother
    /// - `partition`: Slicing of the container, `division` still unset
    /// - `origin`: Position of the target inside one slice
    /// - `angle`: Rotation of the target inside one slice
    ///
    /// Identifier fields of the command become per-copy lists on the
    /// division (`value + i·step` for copy `i`) and are not carried further
    /// down.
    pub(super) fn divide(
        &mut self,
        command: &Command,
        scope: &Scope,
        mut frame: ReferenceFrame,
        mut partition: Partition,
        origin: DVec3,
        angle: DVec3,
    ) -> TranslateResult<()> {
        let mother = frame.mother.ok_or_else(|| TranslateError::DivisionWithoutMother {
            volume: scope.volume.clone(),
        })?;
        let mother_name = self.doc.name(mother).to_string();
        let container = self
            .context
            .solid_id(mother)
            .ok_or_else(|| TranslateError::UnknownVolume {
                context: format!("division of \"{}\"", scope.volume),
                name: mother_name.clone(),
            })?;
        let shape = scope.container.clone().unwrap_or_default();

        let name = self.context.registries_mut().next_division_name(partition.axis);
        // A document translated before already holds its divisions.
        let division = match self.doc.lookup(&name) {
            Some(existing)
                if self.doc.tag(existing) == "division"
                    && self.doc.element(existing).parent() == Some(mother) =>
            {
                existing
            }
            _ => self.doc.append_element(
                Some(mother),
                "division",
                &[("name", name.as_str()), ("volume", mother_name.as_str())],
            )?,
        };
        let id = self.context.register_division(division, &name, partition.copies);

        for identifier in frame.identifiers.drain(..) {
            let values = identifier_values(&identifier, partition.copies, &name)?;
            self.context.set_identifier_list(division, &identifier.field, values);
        }

        debug!(
            id,
            division = %name,
            container = %mother_name,
            axis = %partition.axis,
            start = partition.start,
            step = partition.step,
            copies = partition.copies,
            "division registered"
        );
        self.context.push_event(Event::DivisionRegistered {
            id,
            name,
            container,
            container_name: mother_name,
            axis: partition.axis,
            start: partition.start,
            step: partition.step,
            copies: partition.copies,
        });

        partition.division = Some(division);
        frame.partition = Some(partition);
        frame.mother = Some(division);
        self.context.set_divides(command.target, &shape);
        frame.reset();
        frame.shift(origin);
        frame.rotate(angle);
        self.place_volume(command.target, &frame)?;
        Ok(())
    }
}
