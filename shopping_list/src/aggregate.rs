use std::collections::HashMap;

/// One recipe's requirement of one ingredient.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientUsage {
    pub ingredient_name: String,
    pub measurement_unit: String,
    pub amount: f64,
}

impl IngredientUsage {
    pub fn new(
        ingredient_name: impl Into<String>,
        measurement_unit: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            ingredient_name: ingredient_name.into(),
            measurement_unit: measurement_unit.into(),
            amount,
        }
    }
}

/// Total amount of one ingredient in one unit across every queued recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedLine {
    pub ingredient_name: String,
    pub measurement_unit: String,
    pub total_amount: f64,
}

/// Sums usages that share an exact `(ingredient_name, measurement_unit)` key.
///
/// Keys are compared byte for byte: `"Salt"` and `"salt"` stay separate, and
/// so do `"g"` and `"kg"`. Lines come out in the order their key was first
/// seen in `usages`.
///
/// Panics if an amount is NaN or infinite, or if a running total overflows
/// to infinity.
pub fn aggregate<I>(usages: I) -> Vec<AggregatedLine>
where
    I: IntoIterator<Item = IngredientUsage>,
{
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut lines: Vec<AggregatedLine> = Vec::new();

    for usage in usages {
        assert!(
            usage.amount.is_finite(),
            "ingredient amount for {:?} ({:?}) must be finite, got {}",
            usage.ingredient_name,
            usage.measurement_unit,
            usage.amount
        );

        let key = (usage.ingredient_name, usage.measurement_unit);

        if let Some(&index) = positions.get(&key) {
            let line = &mut lines[index];
            line.total_amount += usage.amount;
            assert!(
                line.total_amount.is_finite(),
                "total amount for {:?} ({:?}) must be finite",
                line.ingredient_name,
                line.measurement_unit
            );
            continue;
        }

        positions.insert(key.clone(), lines.len());
        let (ingredient_name, measurement_unit) = key;
        lines.push(AggregatedLine {
            ingredient_name,
            measurement_unit,
            total_amount: usage.amount,
        });
    }

    lines
}
