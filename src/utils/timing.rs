// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIMING UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Medição de tempo das fases do pipeline (busca, geração).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::time::Instant;

/// Timer para medir duração de uma fase
pub struct ActionTimer {
    start: Instant,
    action_name: String,
}

impl ActionTimer {
    /// Inicia um novo timer para uma fase
    pub fn start(action_name: &str) -> Self {
        Self {
            start: Instant::now(),
            action_name: action_name.to_string(),
        }
    }

    /// Retorna o tempo decorrido em milissegundos
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Para o timer e loga o tempo decorrido
    pub fn stop_and_log(self) -> u128 {
        let elapsed = self.elapsed_ms();
        log::info!("⏱️  {} completado em {}ms", self.action_name, elapsed);
        elapsed
    }
}
