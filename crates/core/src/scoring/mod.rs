pub mod eye_contact_scorer;
