//! Built-in prompt text.

/// Prompt used when the user leaves the analysis prompt untouched.
///
/// Sent to the backend exactly as written.
pub const DEFAULT_PROMPT: &str = "Analyze the food items in the image and provide the following details:

1. List each food item with its estimated calorie content.
2. Calculate the total calories for the entire meal.
3. Provide a breakdown of macronutrients (protein, carbs, fats) in percentages.
4. Assess the overall healthiness of the meal.
5. Suggest any improvements or alternatives for a more balanced diet.";
