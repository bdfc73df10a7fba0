//! Depth-of-inheritance and number-of-children over batches of type
//! declarations.
//!
//! The hierarchy is built fresh for every batch call: parent-to-children
//! and child-to-parents adjacency maps derived from declared base-type
//! lists, with a configurable denylist filtering built-in bases out.
//! Depth is memoized recursion carrying a per-branch visited set; a type
//! revisited on the current path is a cycle, logged as a warning, and
//! that branch contributes 0 instead of recursing forever.
//!
//! When invoked on a single type with no sibling batch context, the
//! calculator falls back to an approximation (depth = direct parent
//! count). Callers needing hierarchy-aware depth must use the batch entry
//! point with the full type list.

use super::{
    CalcOutcome, Calculator, CalculatorConfig, ConfigSchema, ConfigValueKind, FromConfig,
};
use crate::core::{ClassMetrics, Diagnostic};
use crate::source::ClassSource;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A type declaration as the hierarchy sees it: a name and its declared
/// base types
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub base_types: Vec<String>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, base_types: Vec<String>) -> Self {
        Self {
            name: name.into(),
            base_types,
        }
    }
}

/// Result of one batch hierarchy computation
#[derive(Clone, Debug, Default)]
pub struct HierarchyAnalysis {
    depths: HashMap<String, u32>,
    children: BTreeMap<String, BTreeSet<String>>,
    parents: HashMap<String, Vec<String>>,
    declared: HashSet<String>,
    pub warnings: Vec<Diagnostic>,
}

impl HierarchyAnalysis {
    /// Depth of the longest base-type chain above `name`, 0 for roots and
    /// unknown types
    pub fn depth_of(&self, name: &str) -> u32 {
        self.depths.get(name).copied().unwrap_or(0)
    }

    /// Number of direct children
    pub fn number_of_children(&self, name: &str) -> usize {
        self.children.get(name).map(|c| c.len()).unwrap_or(0)
    }

    /// Number of direct and transitive children, cycle-guarded
    pub fn total_descendants(&self, name: &str) -> usize {
        let mut visited = HashSet::new();
        self.count_descendants(name, &mut visited);
        // The starting type itself is not a descendant
        visited.remove(name);
        visited.len()
    }

    fn count_descendants(&self, name: &str, visited: &mut HashSet<String>) {
        if let Some(children) = self.children.get(name) {
            for child in children {
                if visited.insert(child.clone()) {
                    self.count_descendants(child, visited);
                }
            }
        }
    }

    /// Declared types with no retained parents
    pub fn root_count(&self) -> usize {
        self.declared
            .iter()
            .filter(|name| self.parents.get(*name).map(|p| p.is_empty()).unwrap_or(true))
            .count()
    }

    /// Declared types with no children
    pub fn leaf_count(&self) -> usize {
        self.declared
            .iter()
            .filter(|name| self.number_of_children(name) == 0)
            .count()
    }

    /// Declared types with more than one direct parent
    pub fn multiple_inheritance_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .declared
            .iter()
            .filter(|name| self.parents.get(*name).map(|p| p.len() > 1).unwrap_or(false))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Connected components over the bidirectional parent/child graph.
    /// An isolated type is a tree of one.
    pub fn tree_count(&self) -> usize {
        let mut names: BTreeSet<&str> = self.declared.iter().map(String::as_str).collect();
        for (parent, children) in &self.children {
            names.insert(parent.as_str());
            for child in children {
                names.insert(child.as_str());
            }
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut components = 0;
        for name in names {
            if visited.contains(name) {
                continue;
            }
            components += 1;
            let mut stack = vec![name];
            while let Some(current) = stack.pop() {
                if !visited.insert(current) {
                    continue;
                }
                if let Some(parents) = self.parents.get(current) {
                    stack.extend(parents.iter().map(String::as_str));
                }
                if let Some(children) = self.children.get(current) {
                    stack.extend(children.iter().map(String::as_str));
                }
            }
        }
        components
    }
}

/// Computes inheritance depth and fan-out for type declarations
pub struct DepthOfInheritanceCalculator {
    excluded_base_types: HashSet<String>,
}

impl Default for DepthOfInheritanceCalculator {
    fn default() -> Self {
        let excluded = ["object", "Object", "type", "Any", "metaclass"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self {
            excluded_base_types: excluded,
        }
    }
}

impl FromConfig for DepthOfInheritanceCalculator {
    fn from_config(config: &CalculatorConfig) -> Result<Self, crate::core::RegistryError> {
        match config.get_string_list("excluded_base_types") {
            Some(list) => Ok(Self {
                excluded_base_types: list.into_iter().collect(),
            }),
            None => Ok(Self::default()),
        }
    }
}

impl DepthOfInheritanceCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    fn retained_bases(&self, base_types: &[String]) -> Vec<String> {
        base_types
            .iter()
            .filter(|b| !self.excluded_base_types.contains(*b))
            .cloned()
            .collect()
    }

    /// Build adjacency maps and depths for a batch of declarations. Maps
    /// are constructed fresh on every call; nothing is retained between
    /// batches.
    pub fn analyze_hierarchy(&self, types: &[TypeDecl]) -> HierarchyAnalysis {
        let mut analysis = HierarchyAnalysis::default();

        for decl in types {
            let bases = self.retained_bases(&decl.base_types);
            for base in &bases {
                analysis
                    .children
                    .entry(base.clone())
                    .or_default()
                    .insert(decl.name.clone());
            }
            analysis.parents.insert(decl.name.clone(), bases);
            analysis.declared.insert(decl.name.clone());
        }

        for decl in types {
            let mut on_path = HashSet::new();
            let depth = Self::depth_recursive(
                &decl.name,
                &analysis.parents,
                &mut analysis.depths,
                &mut on_path,
                &mut analysis.warnings,
            );
            analysis.depths.insert(decl.name.clone(), depth);
        }

        analysis
    }

    fn depth_recursive(
        name: &str,
        parents: &HashMap<String, Vec<String>>,
        memo: &mut HashMap<String, u32>,
        on_path: &mut HashSet<String>,
        warnings: &mut Vec<Diagnostic>,
    ) -> u32 {
        if let Some(depth) = memo.get(name) {
            return *depth;
        }
        if !on_path.insert(name.to_string()) {
            log::warn!("Inheritance cycle detected at type '{name}'");
            warnings.push(
                Diagnostic::warning(format!(
                    "inheritance cycle detected at '{name}', cyclic edge contributes depth 0"
                ))
                .for_calculator("depth_of_inheritance")
                .for_entity(name),
            );
            return 0;
        }

        let depth = match parents.get(name) {
            None => 0,
            Some(bases) if bases.is_empty() => 0,
            Some(bases) => {
                1 + bases
                    .iter()
                    .map(|base| {
                        Self::depth_recursive(base, parents, memo, on_path, warnings)
                    })
                    .max()
                    .unwrap_or(0)
            }
        };

        on_path.remove(name);
        memo.insert(name.to_string(), depth);
        depth
    }
}

impl Calculator for DepthOfInheritanceCalculator {
    fn name(&self) -> &str {
        "depth_of_inheritance"
    }

    fn description(&self) -> &str {
        "Longest base-type chain and child fan-out per type declaration"
    }

    fn version(&self) -> &str {
        "1.1.0"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::default().field(
            "excluded_base_types",
            ConfigValueKind::StringList,
            "Base-type names ignored when building the hierarchy",
        )
    }

    fn analyze_type_hierarchy(&self, types: &[TypeDecl]) -> Option<HierarchyAnalysis> {
        Some(self.analyze_hierarchy(types))
    }

    fn calculate_for_class(
        &self,
        source: &dyn ClassSource,
        mut metrics: ClassMetrics,
    ) -> CalcOutcome<ClassMetrics> {
        // No sibling context on this path: approximate depth by direct
        // parent count. The batch entry point is authoritative.
        let bases = self.retained_bases(&source.base_types());
        metrics.depth_of_inheritance = bases.len() as u32;

        let mut outcome = CalcOutcome::ok(metrics);
        if !bases.is_empty() {
            outcome.push_warning(
                Diagnostic::warning(
                    "depth approximated from direct parent count; batch hierarchy context unavailable",
                )
                .for_calculator(self.name())
                .for_entity(source.name()),
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, bases: &[&str]) -> TypeDecl {
        TypeDecl::new(name, bases.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn linear_chain_depths() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [
            decl("A", &[]),
            decl("B", &["A"]),
            decl("C", &["B"]),
            decl("D", &["C"]),
        ];
        let analysis = calc.analyze_hierarchy(&types);
        assert_eq!(analysis.depth_of("A"), 0);
        assert_eq!(analysis.depth_of("B"), 1);
        assert_eq!(analysis.depth_of("C"), 2);
        assert_eq!(analysis.depth_of("D"), 3);
        assert_eq!(analysis.number_of_children("A"), 1);
        assert_eq!(analysis.total_descendants("A"), 3);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn two_node_cycle_terminates_with_warning() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [decl("A", &["B"]), decl("B", &["A"])];
        let analysis = calc.analyze_hierarchy(&types);
        assert!(!analysis.warnings.is_empty());
        // Values are defined and finite; the cyclic edge contributed 0
        assert!(analysis.depth_of("A") <= 2);
        assert!(analysis.depth_of("B") <= 2);
    }

    #[test]
    fn descendants_are_cycle_guarded() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [decl("A", &["B"]), decl("B", &["A"])];
        let analysis = calc.analyze_hierarchy(&types);
        assert!(analysis.total_descendants("A") <= 2);
    }

    #[test]
    fn excluded_bases_do_not_count() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [decl("Base", &["object"]), decl("Child", &["Base"])];
        let analysis = calc.analyze_hierarchy(&types);
        assert_eq!(analysis.depth_of("Base"), 0);
        assert_eq!(analysis.depth_of("Child"), 1);
        assert_eq!(analysis.root_count(), 1);
    }

    #[test]
    fn multiple_inheritance_detection() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [
            decl("A", &[]),
            decl("B", &[]),
            decl("C", &["A", "B"]),
        ];
        let analysis = calc.analyze_hierarchy(&types);
        assert_eq!(analysis.multiple_inheritance_types(), vec!["C".to_string()]);
        assert_eq!(analysis.depth_of("C"), 1);
    }

    #[test]
    fn tree_count_separates_disconnected_hierarchies() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [
            decl("A", &[]),
            decl("B", &["A"]),
            decl("X", &[]),
            decl("Y", &["X"]),
            decl("Lone", &[]),
        ];
        let analysis = calc.analyze_hierarchy(&types);
        assert_eq!(analysis.tree_count(), 3);
    }

    #[test]
    fn external_base_contributes_one_level() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [decl("Handler", &["LibraryBase"])];
        let analysis = calc.analyze_hierarchy(&types);
        assert_eq!(analysis.depth_of("Handler"), 1);
    }

    #[test]
    fn leaf_and_root_counts() {
        let calc = DepthOfInheritanceCalculator::new();
        let types = [decl("A", &[]), decl("B", &["A"]), decl("C", &["A"])];
        let analysis = calc.analyze_hierarchy(&types);
        assert_eq!(analysis.root_count(), 1);
        assert_eq!(analysis.leaf_count(), 2);
    }
}
