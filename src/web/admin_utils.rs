/// Compose a flash message HTML snippet for known dashboard status or error codes.
pub fn compose_flash_message(status: Option<&str>, error: Option<&str>) -> String {
    if let Some(status) = status {
        let message = match status {
            "accepted" => "La note de frais a été acceptée.",
            "refused" => "La note de frais a été refusée.",
            _ => "",
        };

        if !message.is_empty() {
            return format!(r#"<div class="flash success">{message}</div>"#);
        }
    }

    if let Some(error) = error {
        let message = match error {
            "not_found" => "Note de frais introuvable.",
            "missing_bill" => "Aucune note de frais sélectionnée.",
            "unauthorized" => "Session expirée, veuillez vous reconnecter.",
            "update_failed" => "La mise à jour a échoué, veuillez réessayer.",
            _ => "Une erreur inconnue est survenue, consultez les journaux.",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}
