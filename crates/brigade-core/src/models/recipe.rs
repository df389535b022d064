//! Recipe graph: a validated, ordered collection of instructions.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::Instruction;
use crate::error::{KitchenError, Result};

/// Words that mark a step as passive in the delimited recipe format.
const PASSIVE_KEYWORDS: &[&str] = &[
    "bake",
    "preheat",
    "soften",
    "put out",
    "room temp",
    "cool",
    "simmer",
    "refri",
    "chill",
];

/// Ordered sequence of instructions forming a dependency DAG.
///
/// Construction validates that indices are unique, durations positive,
/// dependency references resolve and the graph has no cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<Instruction>", into = "Vec<Instruction>")]
pub struct Recipe {
    instructions: Vec<Instruction>,
}

impl Recipe {
    pub fn new(instructions: Vec<Instruction>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for instruction in &instructions {
            if !seen.insert(instruction.index) {
                return Err(KitchenError::configuration(format!(
                    "duplicate instruction index {}",
                    instruction.index
                )));
            }
            if instruction.duration == 0 {
                return Err(KitchenError::configuration(format!(
                    "instruction {} must have a positive duration",
                    instruction.index
                )));
            }
        }
        for instruction in &instructions {
            if let Some(missing) = instruction
                .dependencies
                .iter()
                .find(|dep| !seen.contains(*dep))
            {
                return Err(KitchenError::configuration(format!(
                    "instruction {} depends on unknown instruction {missing}",
                    instruction.index
                )));
            }
        }

        let recipe = Self { instructions };
        recipe.check_acyclic()?;
        Ok(recipe)
    }

    /// Parses a JSON array of instructions.
    pub fn from_json(json: &str) -> Result<Self> {
        let instructions: Vec<Instruction> = serde_json::from_str(json)?;
        Self::new(instructions)
    }

    /// Parses the line format `index;text;seconds;deps`.
    ///
    /// `deps` is a comma-separated, possibly empty, list of indices. Blank
    /// lines and lines starting with `#` are skipped. Attention is inferred:
    /// steps mentioning baking, chilling, simmering and similar background
    /// work are passive.
    ///
    /// ```rust
    /// use brigade_core::models::Recipe;
    ///
    /// let recipe = Recipe::from_delimited(
    ///     "0;Beat eggs;60;\n1;Bake the cake;1500;0\n",
    /// )?;
    /// assert_eq!(recipe.len(), 2);
    /// assert!(recipe.get(0).unwrap().attention);
    /// assert!(!recipe.get(1).unwrap().attention);
    /// # Ok::<(), brigade_core::KitchenError>(())
    /// ```
    pub fn from_delimited(text: &str) -> Result<Self> {
        let mut instructions = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            instructions.push(parse_delimited_line(line_no + 1, line)?);
        }
        Self::new(instructions)
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        // Dense zero-based recipes hit the fast path.
        match self.instructions.get(index) {
            Some(instruction) if instruction.index == index => Some(instruction),
            _ => self.instructions.iter().find(|i| i.index == index),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.instructions.iter().map(|i| i.index)
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Kahn's algorithm; any node left unvisited sits on a cycle.
    fn check_acyclic(&self) -> Result<()> {
        let mut in_degree: BTreeMap<usize, usize> = self
            .instructions
            .iter()
            .map(|i| (i.index, i.dependencies.len()))
            .collect();
        let mut dependants: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for instruction in &self.instructions {
            for dep in &instruction.dependencies {
                dependants.entry(*dep).or_default().push(instruction.index);
            }
        }

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| *index)
            .collect();
        let mut visited = 0;
        while let Some(index) = queue.pop_front() {
            visited += 1;
            for next in dependants.get(&index).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }

        if visited == self.instructions.len() {
            Ok(())
        } else {
            Err(KitchenError::configuration(
                "recipe dependencies contain a cycle",
            ))
        }
    }
}

fn parse_delimited_line(line_no: usize, line: &str) -> Result<Instruction> {
    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(KitchenError::invalid_input("recipe").with_reason(format!(
            "line {line_no}: expected 4 ';'-separated fields, found {}",
            fields.len()
        )));
    }

    let parse_index = |field: &str, what: &str| -> Result<usize> {
        field.parse::<usize>().map_err(|_| {
            KitchenError::invalid_input("recipe")
                .with_reason(format!("line {line_no}: invalid {what} '{field}'"))
        })
    };

    let index = parse_index(fields[0], "index")?;
    let duration = fields[2].parse::<u32>().map_err(|_| {
        KitchenError::invalid_input("recipe")
            .with_reason(format!("line {line_no}: invalid duration '{}'", fields[2]))
    })?;
    let dependencies = fields[3]
        .split(',')
        .map(str::trim)
        .filter(|dep| !dep.is_empty())
        .map(|dep| parse_index(dep, "dependency"))
        .collect::<Result<BTreeSet<_>>>()?;

    let text = fields[1].to_string();
    let lowered = text.to_lowercase();
    let attention = !PASSIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw));

    Ok(Instruction {
        index,
        task: text,
        duration,
        attention,
        dependencies,
    })
}

impl TryFrom<Vec<Instruction>> for Recipe {
    type Error = KitchenError;

    fn try_from(instructions: Vec<Instruction>) -> Result<Self> {
        Self::new(instructions)
    }
}

impl From<Recipe> for Vec<Instruction> {
    fn from(recipe: Recipe) -> Self {
        recipe.instructions
    }
}

impl<'a> IntoIterator for &'a Recipe {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
