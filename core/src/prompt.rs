use crate::measurement::Measurement;

/// Render the advice request for one measurement.
///
/// Output is deterministic and both readings are shown with one decimal.
/// The reply schema includes `needs_light` even though validation does not
/// require it.
pub fn build_prompt(measurement: &Measurement) -> String {
    format!(
        "Eres un experto en cuidado de plantas. Responderás en español y \
         proporcionarás recomendaciones específicas basadas en los datos de humedad \
         y temperatura que recibes. La respuesta debe ser un único objeto JSON con \
         exactamente las claves 'needs_watering', 'needs_soil', 'needs_light' y 'comment'. \
         No incluyas ningún texto fuera del JSON. \
         La planta tiene una humedad de {:.1}% y una temperatura de {:.1} °C. \
         Indica si necesita riego, más tierra o más luz.",
        measurement.humidity(),
        measurement.temperature(),
    )
}
