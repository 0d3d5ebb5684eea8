//! Synchronization of a shared block into one parameter set.

use std::sync::Arc;

use crate::error::{ParamsError, ParamsResult};
use crate::named::{ConstantDefinition, NamedConstantTable};
use crate::storage::{FloatConstantStorage, IntConstantStorage};
use crate::types::ConstantType;

use super::{SharedParameterBlock, SharedParameterBlockRef};

/// Lifecycle of a usage's copy plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageState {
    /// No plan has been built yet.
    Uninitialized,
    /// The plan matches the block's current version.
    PlanBuilt,
    /// The block changed since the plan was built.
    Stale,
}

/// One constant to transfer from the shared block into the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlanEntry {
    /// Constant name, identical on both sides.
    pub name: String,
    /// Layout inside the shared block.
    pub source: ConstantDefinition,
    /// Layout inside the target parameter set.
    pub dest: ConstantDefinition,
}

/// The parts of a parameter set a shared copy writes into.
#[derive(Debug)]
pub struct CopyTarget<'a> {
    /// Named table of the target, if it has one.
    pub named: Option<&'a NamedConstantTable>,
    /// Float storage of the target.
    pub floats: &'a mut FloatConstantStorage,
    /// Int storage of the target.
    pub ints: &'a mut IntConstantStorage,
    /// Whether 4x4 matrices are transposed on the way in.
    pub transpose_matrices: bool,
}

/// Binds one shared block to one parameter set.
#[derive(Debug, Clone)]
pub struct SharedParameterUsage {
    block: SharedParameterBlockRef,
    name: String,
    plan: Vec<CopyPlanEntry>,
    plan_version: Option<u64>,
}

impl SharedParameterUsage {
    /// Bind a block to a target and build the initial copy plan.
    pub fn new(block: SharedParameterBlockRef, target: Option<&NamedConstantTable>) -> Self {
        let name = block.read().name().to_string();
        let mut usage = Self {
            block,
            name,
            plan: Vec::new(),
            plan_version: None,
        };
        usage.build_plan(target);
        usage
    }

    /// Name of the shared block.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared block.
    pub fn block(&self) -> &SharedParameterBlockRef {
        &self.block
    }

    /// Current copy plan.
    pub fn plan(&self) -> &[CopyPlanEntry] {
        &self.plan
    }

    /// Block version the plan was built against.
    pub fn plan_version(&self) -> Option<u64> {
        self.plan_version
    }

    /// Plan state relative to the block's current version.
    pub fn state(&self) -> UsageState {
        match self.plan_version {
            None => UsageState::Uninitialized,
            Some(version) if version == self.block.read().version() => UsageState::PlanBuilt,
            Some(_) => UsageState::Stale,
        }
    }

    /// Drop the plan so it is rebuilt on the next copy.
    pub fn invalidate(&mut self) {
        self.plan.clear();
        self.plan_version = None;
    }

    /// Rebuild the copy plan against `target`.
    pub fn build_plan(&mut self, target: Option<&NamedConstantTable>) {
        let block = Arc::clone(&self.block);
        let block = block.read();
        self.build_plan_from(&block, target);
    }

    fn build_plan_from(
        &mut self,
        block: &SharedParameterBlock,
        target: Option<&NamedConstantTable>,
    ) {
        crate::profile_scope!("shared_build_plan");

        self.plan.clear();
        if let Some(target) = target {
            for (name, source) in block.named_constants().iter() {
                let Some(dest) = target.get(name) else {
                    continue;
                };
                if dest.constant_type != source.constant_type
                    || dest.array_size != source.array_size
                {
                    log::trace!(
                        "Shared '{}': skipping '{}', {:?}[{}] does not match {:?}[{}]",
                        self.name,
                        name,
                        source.constant_type,
                        source.array_size,
                        dest.constant_type,
                        dest.array_size
                    );
                    continue;
                }
                self.plan.push(CopyPlanEntry {
                    name: name.to_string(),
                    source: source.clone(),
                    dest: dest.clone(),
                });
            }
        }
        self.plan_version = Some(block.version());

        log::debug!(
            "Shared '{}': built copy plan v{} with {} entries",
            self.name,
            block.version(),
            self.plan.len()
        );
    }

    /// Copy the shared values into `target`, rebuilding the plan first if
    /// the block changed.
    pub fn copy_shared_to_target(&mut self, target: CopyTarget<'_>) -> ParamsResult<()> {
        crate::profile_scope!("shared_copy");

        let block = Arc::clone(&self.block);
        let block = block.read();
        if self.plan_version != Some(block.version()) {
            self.build_plan_from(&block, target.named);
        }

        for entry in &self.plan {
            if entry.dest.is_float() {
                copy_values(
                    entry,
                    block.float_constants(),
                    target.floats.as_mut_slice(),
                    target.transpose_matrices,
                )?;
            } else {
                copy_values(
                    entry,
                    block.int_constants(),
                    target.ints.as_mut_slice(),
                    false,
                )?;
            }
        }
        Ok(())
    }
}

fn out_of_range(entry: &CopyPlanEntry) -> ParamsError {
    ParamsError::InvalidArgument(format!(
        "shared constant '{}' lies outside the buffer",
        entry.name
    ))
}

/// Copy one plan entry, translating between packed and padded layouts.
fn copy_values<T: Copy>(
    entry: &CopyPlanEntry,
    src: &[T],
    dst: &mut [T],
    transpose_matrices: bool,
) -> ParamsResult<()> {
    let source = &entry.source;
    let dest = &entry.dest;
    let src_total = source.element_size * source.array_size;
    let dst_total = dest.element_size * dest.array_size;

    let src = src
        .get(source.physical_index..source.physical_index + src_total)
        .ok_or_else(|| out_of_range(entry))?;
    let dst = dst
        .get_mut(dest.physical_index..dest.physical_index + dst_total)
        .ok_or_else(|| out_of_range(entry))?;

    if transpose_matrices && dest.constant_type == ConstantType::Matrix4x4 {
        for (src_matrix, dst_matrix) in src.chunks_exact(16).zip(dst.chunks_exact_mut(16)) {
            for row in 0..4 {
                for col in 0..4 {
                    dst_matrix[row * 4 + col] = src_matrix[col * 4 + row];
                }
            }
        }
    } else if source.element_size == dest.element_size {
        dst.copy_from_slice(src);
    } else {
        if dest.element_size % 4 != 0 {
            return Err(ParamsError::UnsupportedOperation(format!(
                "cannot copy '{}' into an element size of {}",
                entry.name, dest.element_size
            )));
        }
        // Arrays spread the whole source range over every destination
        // register, so the per-register count comes from the total size.
        let iterations = dest.element_size / 4 * dest.array_size;
        let per_iteration = src_total / iterations;
        if per_iteration > 4 {
            return Err(ParamsError::UnsupportedOperation(format!(
                "cannot pack {} values of '{}' into one register",
                per_iteration, entry.name
            )));
        }
        for (src_chunk, dst_chunk) in src
            .chunks_exact(per_iteration.max(1))
            .zip(dst.chunks_exact_mut(4))
            .take(iterations)
        {
            dst_chunk[..per_iteration].copy_from_slice(&src_chunk[..per_iteration]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variability;

    fn entry(
        constant_type: ConstantType,
        src_index: usize,
        src_size: usize,
        dst_index: usize,
        dst_size: usize,
    ) -> CopyPlanEntry {
        CopyPlanEntry {
            name: "value".to_string(),
            source: ConstantDefinition::new(constant_type, src_index, src_size, 1),
            dest: ConstantDefinition::new(constant_type, dst_index, dst_size, 1)
                .with_variability(Variability::GLOBAL),
        }
    }

    #[test]
    fn test_equal_size_copy() {
        let src = [1.0, 2.0, 3.0, 4.0];
        let mut dst = [0.0; 8];
        copy_values(&entry(ConstantType::Float4, 0, 4, 4, 4), &src, &mut dst, false).unwrap();
        assert_eq!(dst, [0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_padded_copy_leaves_padding() {
        let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut dst = [-1.0; 8];
        copy_values(&entry(ConstantType::Matrix2x3, 0, 6, 0, 8), &src, &mut dst, false).unwrap();
        assert_eq!(dst, [1.0, 2.0, 3.0, -1.0, 4.0, 5.0, 6.0, -1.0]);
    }

    #[test]
    fn test_padded_copy_requires_register_multiple() {
        let src = [0.0; 6];
        let mut dst = [0.0; 8];
        let err =
            copy_values(&entry(ConstantType::Matrix2x3, 0, 6, 0, 7), &src, &mut dst, false)
                .unwrap_err();
        assert!(matches!(err, ParamsError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_transpose_4x4() {
        let src: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let mut dst = [0.0; 16];
        copy_values(&entry(ConstantType::Matrix4x4, 0, 16, 0, 16), &src, &mut dst, true)
            .unwrap();
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(dst[row * 4 + col], src[col * 4 + row]);
            }
        }
    }

    #[test]
    fn test_padded_copy_rejects_overfull_register() {
        // Twelve source values over two destination registers.
        let src = [0.0; 12];
        let mut dst = [0.0; 8];
        let err =
            copy_values(&entry(ConstantType::Matrix3x4, 0, 12, 0, 8), &src, &mut dst, false)
                .unwrap_err();
        assert!(matches!(err, ParamsError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_new_usage_builds_plan() {
        let mut block = SharedParameterBlock::new("frame");
        block
            .add_constant_definition("tint", ConstantType::Float4, 1)
            .unwrap();
        let block = block.into_shared();

        let mut target = NamedConstantTable::new();
        target.insert("tint", ConstantDefinition::new(ConstantType::Float4, 8, 4, 1));

        let mut usage = SharedParameterUsage::new(block, Some(&target));
        assert_eq!(usage.state(), UsageState::PlanBuilt);
        assert_eq!(usage.plan().len(), 1);
        assert_eq!(usage.plan()[0].dest.physical_index, 8);

        usage.invalidate();
        assert_eq!(usage.state(), UsageState::Uninitialized);
        assert!(usage.plan().is_empty());
    }

    #[test]
    fn test_out_of_range_is_error() {
        let src = [0.0; 2];
        let mut dst = [0.0; 4];
        assert!(
            copy_values(&entry(ConstantType::Float4, 0, 4, 0, 4), &src, &mut dst, false).is_err()
        );
    }
}
