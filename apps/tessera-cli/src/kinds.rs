//! Asset kinds used by the demo session.

use glam::Vec3;
use tessera_res::{AssetKind, Property, Ref, Reflector, Teller};

/// A vertex frame, e.g. one keyframe of a mesh animation.
pub struct Frame {
    pub vertices: Property<Vec<Vec3>>,
}

impl AssetKind for Frame {
    const KIND: &'static str = "frame";

    fn reflect<R: Reflector>(&self, rfl: &mut R) {
        rfl.field(&self.vertices, "Vertices");
    }
}

impl Frame {
    /// A row of `count` vertices spaced two units apart along X.
    pub fn row(count: usize) -> Self {
        Self {
            vertices: Property::new(
                (0..count)
                    .map(|i| Vec3::new(i as f32 * 2.0, 0.0, 0.0))
                    .collect(),
            ),
        }
    }

    /// Offset vertex `index` by `delta`. Out-of-range indices are ignored.
    pub fn nudge(&self, ts: &mut Teller, index: usize, delta: Vec3) {
        let mut vertices = self.vertices.get();
        if let Some(v) = vertices.get_mut(index) {
            *v += delta;
            self.vertices.set(ts, vertices);
        }
    }

    pub fn centroid(&self) -> Vec3 {
        self.vertices.with(|vs| {
            if vs.is_empty() {
                Vec3::ZERO
            } else {
                vs.iter().copied().sum::<Vec3>() / vs.len() as f32
            }
        })
    }
}

/// A model that displays one frame.
pub struct Model {
    pub frame: Property<Ref<Frame>>,
}

impl AssetKind for Model {
    const KIND: &'static str = "model";

    fn reflect<R: Reflector>(&self, rfl: &mut R) {
        rfl.field(&self.frame, "Frame");
    }
}

/// Collects the labels a kind reflects, in declaration order.
#[derive(Debug, Default)]
pub struct FieldLabels(pub Vec<&'static str>);

impl Reflector for FieldLabels {
    fn field<T: 'static>(&mut self, _prop: &Property<T>, label: &'static str) {
        self.0.push(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_res::{Atom, Project, ResError};

    #[test]
    fn nudge_is_undoable() {
        let project = Project::new();
        let frame = project
            .run(|ts| project.create(ts, Atom::parse("/f").unwrap(), Frame::row(3)))
            .unwrap();
        assert_eq!(frame.centroid(), Vec3::new(2.0, 0.0, 0.0));

        project
            .run(|ts| {
                frame.nudge(ts, 1, Vec3::Y * 3.0);
                Ok::<_, ResError>(())
            })
            .unwrap();
        assert_eq!(frame.centroid(), Vec3::new(2.0, 1.0, 0.0));

        project.undo().unwrap();
        assert_eq!(frame.centroid(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn kinds_reflect_their_properties() {
        let project = Project::new();
        let (frame, model) = project
            .run(|ts| {
                let frame = project.create(ts, Atom::parse("/f").unwrap(), Frame::row(1))?;
                let model = project.create(
                    ts,
                    Atom::parse("/m").unwrap(),
                    Model {
                        frame: Property::new(frame.to_ref()),
                    },
                )?;
                Ok::<_, ResError>((frame, model))
            })
            .unwrap();
        let mut labels = FieldLabels::default();
        frame.reflect(&mut labels);
        model.reflect(&mut labels);
        assert_eq!(labels.0, vec!["Vertices", "Frame"]);
    }

    #[test]
    fn nudge_out_of_range_records_nothing() {
        let project = Project::new();
        let frame = project
            .run(|ts| project.create(ts, Atom::parse("/f").unwrap(), Frame::row(1)))
            .unwrap();
        let ops = project
            .run(|ts| {
                frame.nudge(ts, 7, Vec3::X);
                Ok::<_, ResError>(ts.op_count())
            })
            .unwrap();
        assert_eq!(ops, 0);
    }
}
