use super::context::HookContext;
use crate::job::{JobInsertParams, JobRow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lifecycle points a hook can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookCapability {
    /// Before a job is inserted.
    InsertBegin,
    /// Before a claimed job's body runs.
    WorkBegin,
}

impl HookCapability {
    pub const ALL: [HookCapability; 2] = [HookCapability::InsertBegin, HookCapability::WorkBegin];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookCapability::InsertBegin => "insert_begin",
            HookCapability::WorkBegin => "work_begin",
        }
    }
}

impl std::fmt::Display for HookCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker trait every hook implements.
///
/// A hook takes part in a lifecycle point only if it also implements that
/// point's capability trait *and* returns itself from the matching accessor.
/// Accessors default to `None`, so a hook written before a capability existed
/// never picks it up by accident.
///
/// ```ignore
/// struct AuditHook;
///
/// impl Hook for AuditHook {
///     fn as_insert_begin(&self) -> Option<&dyn HookInsertBegin> {
///         Some(self)
///     }
/// }
/// ```
pub trait Hook: Send + Sync {
    /// Name used in logs and in rejection errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn as_insert_begin(&self) -> Option<&dyn HookInsertBegin> {
        None
    }

    fn as_work_begin(&self) -> Option<&dyn HookWorkBegin> {
        None
    }

    fn implements(&self, capability: HookCapability) -> bool {
        match capability {
            HookCapability::InsertBegin => self.as_insert_begin().is_some(),
            HookCapability::WorkBegin => self.as_work_begin().is_some(),
        }
    }

    fn capabilities(&self) -> Vec<HookCapability> {
        HookCapability::ALL
            .into_iter()
            .filter(|c| self.implements(*c))
            .collect()
    }
}

/// Runs before a job is inserted.
///
/// Returning an error aborts the insertion. The params may be modified in
/// place; later hooks and the insert itself see the modified values.
#[async_trait]
pub trait HookInsertBegin: Hook {
    async fn insert_begin(
        &self,
        ctx: &HookContext,
        params: &mut JobInsertParams,
    ) -> anyhow::Result<()>;
}

/// Runs after a job has been claimed and before its body executes.
///
/// Returning an error means the job is not worked on this attempt.
#[async_trait]
pub trait HookWorkBegin: Hook {
    async fn work_begin(&self, ctx: &HookContext, job: &mut JobRow) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;
    impl Hook for Inert {}

    struct InsertOnly;
    impl Hook for InsertOnly {
        fn name(&self) -> &str {
            "insert_only"
        }

        fn as_insert_begin(&self) -> Option<&dyn HookInsertBegin> {
            Some(self)
        }
    }

    #[async_trait]
    impl HookInsertBegin for InsertOnly {
        async fn insert_begin(
            &self,
            _ctx: &HookContext,
            _params: &mut JobInsertParams,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Implements the work trait but never advertises it through the accessor.
    struct Unadvertised;
    impl Hook for Unadvertised {}

    #[async_trait]
    impl HookWorkBegin for Unadvertised {
        async fn work_begin(&self, _ctx: &HookContext, _job: &mut JobRow) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_marker_only_hook_has_no_capabilities() {
        assert!(Inert.capabilities().is_empty());
        assert!(Inert.name().ends_with("Inert"));
    }

    #[test]
    fn test_capabilities_follow_accessors() {
        assert_eq!(InsertOnly.capabilities(), vec![HookCapability::InsertBegin]);
        assert!(!InsertOnly.implements(HookCapability::WorkBegin));
        assert_eq!(InsertOnly.name(), "insert_only");
    }

    #[test]
    fn test_trait_impl_without_accessor_is_not_a_capability() {
        assert!(!Unadvertised.implements(HookCapability::WorkBegin));
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(HookCapability::InsertBegin.to_string(), "insert_begin");
        assert_eq!(HookCapability::WorkBegin.to_string(), "work_begin");
    }
}
